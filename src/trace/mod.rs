//! iosnoop output decoding: columns, typed values, rows and the streaming parser.

pub mod columns;
pub mod parse;
pub mod row;
pub mod value;

pub use parse::TraceParser;
pub use row::Row;
pub use value::{Value, decode};
