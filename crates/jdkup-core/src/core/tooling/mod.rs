pub mod outcome;
pub mod response;

pub use outcome::{CommandStatus, ExecutionOutcome};
pub use response::{format_status_message, to_json_response};
