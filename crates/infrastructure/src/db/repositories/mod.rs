mod message_repository_impl;
mod user_repository_impl;

pub use message_repository_impl::PgMessageRepository;
pub use user_repository_impl::PgUserRepository;
