//! The Response Parser: turns a raw model response into cleaned
//! prose plus an ordered list of tool calls.

pub mod response_parser;

pub use response_parser::{parse, ParsedResponse};
