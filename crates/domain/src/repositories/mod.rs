pub mod message_repository;
pub mod user_repository;

pub use message_repository::{MessageRepository, UserMessageStats};
pub use user_repository::UserRepository;
