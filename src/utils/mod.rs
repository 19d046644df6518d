pub mod file_detection;
pub mod format;
pub mod test_helpers;

pub use file_detection::{ExtensionFilter, DEFAULT_EXTENSIONS};
pub use format::{format_file_count, format_size};
