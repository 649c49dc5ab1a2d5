pub mod log;
pub mod stream;

pub use log::LogEventOperations;
pub use stream::LogStreamOperations;
