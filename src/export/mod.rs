pub mod csv;
pub mod json;

pub use crate::error::ExportError;
pub use csv::{element_rows, export_csv, ElementRow};
pub use json::{export_json, model_report, ModelReport};
