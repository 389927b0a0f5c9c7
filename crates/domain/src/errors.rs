//! 领域错误定义
//!
//! 封闭的错误分类：每个变体对应一个固定的 HTTP 状态码，
//! 由 web 层的终端错误处理器统一转换为响应。

use thiserror::Error;

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 输入验证失败、唯一字段冲突
    #[error("{message}")]
    Validation { message: String },

    /// 凭证缺失、无效或过期
    #[error("{message}")]
    Unauthorized { message: String },

    /// 访问策略拒绝
    #[error("{message}")]
    Forbidden { message: String },

    /// 限流拒绝，与 Forbidden 保持独立分类
    #[error("{message}")]
    TooManyRequests { message: String },

    /// 资源或路由不存在
    #[error("{message}")]
    NotFound { message: String },

    /// 存储操作失败
    #[error("{message}")]
    Database { message: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// 创建认证错误
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// 创建访问策略错误
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// 创建限流错误
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::TooManyRequests {
            message: message.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// 创建数据库错误
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
