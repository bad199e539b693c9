pub mod gemini;
pub mod util;

pub use gemini::Gemini;
pub use util::{parse_json_response, strip_code_blocks};
