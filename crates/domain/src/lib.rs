//! 领域层
//!
//! 留言板的实体、封闭错误分类、纯业务规则和 Repository 接口。

pub mod business_rules;
pub mod entities;
pub mod errors;
pub mod repositories;

pub use business_rules::{PostingWindowRules, UploadRules, MAX_UPLOAD_BYTES};
pub use entities::{AttachmentDescriptor, Message, User};
pub use errors::{DomainError, DomainResult};
pub use repositories::{MessageRepository, UserMessageStats, UserRepository};
