use std::path::Path;

use dentbooks_storage::NormalizedEntry;

use crate::{print_json, read_json};

/// The flat entry is a document, so text and JSON output are the same.
pub(crate) fn cmd_flatten(normalized_path: &Path, quiet: bool) -> Result<(), String> {
    let normalized: NormalizedEntry = serde_json::from_value(read_json(normalized_path)?)
        .map_err(|e| format!("invalid normalized entry in {}: {}", normalized_path.display(), e))?;

    let flat = dentbooks_storage::to_flat(&normalized).map_err(|e| e.to_string())?;
    if quiet {
        return Ok(());
    }
    print_json(&flat)
}
