//! 应用层
//!
//! 编排领域对象的服务、限流器、广播通道，以及对外部协作方
//! （密码哈希、时钟、文件存储、邮件投递）的接口定义。

pub mod broadcaster;
pub mod clock;
pub mod local_broadcast;
pub mod mailer;
pub mod password;
pub mod rate_limiter;
pub mod services;
pub mod storage;

pub use broadcaster::{BroadcastError, MessageBroadcast, MessageBroadcaster};
pub use clock::{Clock, SystemClock};
pub use local_broadcast::LocalMessageBroadcaster;
pub use mailer::{Mailer, MailerError};
pub use password::{PasswordHasher, PasswordHasherError};
pub use rate_limiter::{RateLimitError, RequestRateLimiter};
pub use services::{
    AuthenticateUserRequest, CreateMessageRequest, MessageService, MessageServiceDependencies,
    RegisterUserRequest, UpdateMessageRequest, UploadMessageRequest, UserService,
    UserServiceDependencies,
};
pub use storage::{BlobStorage, StorageError};
