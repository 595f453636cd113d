//! Low-level parsing infrastructure shared by the Newick reader:
//! a byte [Cursor](cursor::Cursor) and structured
//! [ParseError](error::ParseError)s carrying byte offsets.

pub mod cursor;
pub mod error;

pub use cursor::Cursor;
pub use error::{ParseError, ParseErrorKind};
