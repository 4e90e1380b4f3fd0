//! Run report output
//!
//! - `json`: machine-readable report on stdout (`--json`)
//! - `text`: per-target summary logged with `-v`

pub mod json;
pub mod text;
