pub mod escape;
pub mod source_map;

pub use escape::{
    check_json_str, escape_into, escape_json_string, reescape_into, unescape_json_str,
    unescape_json_string,
};
pub use source_map::{LineIndex, SourceMap};
