pub mod state;
pub mod terminal;

pub use state::{ChatState, SendRejection};
pub use terminal::{execute, handle_event, parse_command, Command, Flow};
