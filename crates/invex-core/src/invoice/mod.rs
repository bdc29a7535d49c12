//! Invoice field extraction.

mod baseline;
mod line_items;
pub mod rules;

pub use baseline::{extract_baseline, BaselineExtractor};
pub use line_items::extract_line_items;
