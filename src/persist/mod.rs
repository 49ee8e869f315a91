mod bits;
mod json;
mod record;

pub use json::{from_json_str, read_json, to_json_string, write_json};
pub use record::{FORMAT_VERSION, LevelRecord, ObservableRecord};
