pub mod parser;
pub mod reader;
pub mod record;

pub use parser::parse;
pub use reader::{Deserializer, FromJson};
pub use record::RecordReader;
