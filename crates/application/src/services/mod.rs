mod message_service;
mod user_service;

#[cfg(test)]
mod user_service_tests;

pub use message_service::{
    CreateMessageRequest, MessageService, MessageServiceDependencies, UpdateMessageRequest,
    UploadMessageRequest,
};
pub use user_service::{
    AuthenticateUserRequest, RegisterUserRequest, UserService, UserServiceDependencies,
};
