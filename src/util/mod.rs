pub mod file_logger;
pub mod log;

pub use file_logger::{FileLogLayer, FileLogger};
pub use log::init_logging;
