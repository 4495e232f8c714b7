//! Machine interface output: line framing, record grammar and data model.

pub mod escape;
pub mod framer;
pub mod parser;
pub mod record;

pub use framer::LineFramer;
pub use parser::{parse, parse_prefix};
pub use record::{
    AsyncKind, AsyncRecord, List, Record, ResultClass, ResultRecord, Results, StreamKind,
    StreamRecord, Token, Value,
};
