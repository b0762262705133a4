use std::path::Path;

use dentbooks_engine::EngineConfig;
use dentbooks_storage::{FlatEntry, MethodDetails, NormalizedEntry};

use crate::{print_json, read_json, OutputFormat};

pub(crate) fn cmd_normalize(
    form_path: &Path,
    entry_path: &Path,
    config: &EngineConfig,
    output: OutputFormat,
    quiet: bool,
) -> Result<(), String> {
    let form = dentbooks_forms::parse_form(&read_json(form_path)?).map_err(|e| e.to_string())?;
    let entry: FlatEntry = serde_json::from_value(read_json(entry_path)?)
        .map_err(|e| format!("invalid entry in {}: {}", entry_path.display(), e))?;

    let normalized =
        dentbooks_storage::to_normalized_with(&entry, &form, config).map_err(|e| e.to_string())?;

    if quiet {
        return Ok(());
    }
    match output {
        OutputFormat::Json => print_json(&normalized),
        OutputFormat::Text => {
            print_text(&normalized);
            Ok(())
        }
    }
}

fn print_text(entry: &NormalizedEntry) {
    let header = &entry.header;
    println!(
        "Entry {} (form {}, {} / {})",
        header.entry_id, header.form_id, header.calculation_method, header.form_type
    );
    println!("  field values:       {}", entry.field_values.len());
    println!("  field calculations: {}", entry.field_calculations.len());
    println!(
        "  summary:            {}",
        if entry.summary.is_some() { "yes" } else { "no" }
    );
    match &entry.method_details {
        MethodDetails::Net(_) => println!("  net details:        1"),
        MethodDetails::Gross {
            additional_reductions,
            reductions_summary,
            outwork,
            ..
        } => {
            println!("  gross details:      1");
            println!("  additional reductions: {}", additional_reductions.len());
            println!(
                "  reductions summary: {}",
                if reductions_summary.is_some() { "yes" } else { "no" }
            );
            println!(
                "  outwork:            {}",
                if outwork.is_some() { "yes" } else { "no" }
            );
        }
        MethodDetails::None => println!("  method details:     none"),
    }
    println!("  gross reductions:   {}", entry.gross_reductions.len());
    println!("  gross reimbursements: {}", entry.gross_reimbursements.len());
    println!(
        "  deductions:         {}",
        if entry.deductions.is_some() { "yes" } else { "no" }
    );
}
