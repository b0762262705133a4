//! dentbooks-forms: typed inputs for the entry calculation engine.
//!
//! Provides the form definition (ordered field list, GST configuration,
//! calculation method, form type), the caller's entry values and the
//! optional deduction overrides, together with parsing entry points that
//! turn already-validated JSON into these types.
//!
//! Parsing is deliberately lenient about enumerations that arrive as
//! free-form strings (sections, methods, form types) and strict about
//! structure: a fields or values payload that is not the expected JSON
//! shape fails fast with a [`FormError`].

pub mod deserialize;
pub mod types;

pub use deserialize::{parse_deductions, parse_form, parse_values, FormError};
pub use types::*;
