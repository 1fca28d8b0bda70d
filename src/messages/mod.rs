pub mod storage;
pub mod types;

pub use storage::MessageStorage;
pub use types::{ImageAttachment, InlineImage, Message, Role};
