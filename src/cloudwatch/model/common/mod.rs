pub mod log_event;
pub mod log_stream;
pub mod request;

// Re-export common types for easier access
pub use log_event::{LogEvent, LogEventsPage};
pub use log_stream::LogStreamSummary;
pub use request::{Direction, LogEventsRequest, RequestWindow};
