pub mod message;
pub mod user;

pub use message::{AttachmentDescriptor, Message};
pub use user::User;
