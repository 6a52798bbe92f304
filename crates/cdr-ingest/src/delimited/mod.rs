//! Delimited-text reading.

mod header;
mod reader;

pub use header::{Separator, detect_separator};
pub use reader::{decode_text, parse_delimited};
