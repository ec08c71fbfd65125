//! Documents: owned value trees with change events and JSON persistence

pub mod reader;
pub mod tree;
pub mod writer;

pub use reader::DocumentError;
pub use tree::Document;
pub use writer::{DOCUMENT_VERSION, to_json};
