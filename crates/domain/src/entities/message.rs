//! 留言实体定义

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 附件描述符
///
/// 本地存储和对象存储互斥，由配置的存储后端决定，创建后不再变更。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentDescriptor {
    /// 本地磁盘存储
    Local { path: String, original_name: String },
    /// 对象存储
    Object { key: String, url: String },
}

impl AttachmentDescriptor {
    /// 客户端可用的访问位置（本地相对路径或公开 URL）
    pub fn location(&self) -> &str {
        match self {
            Self::Local { path, .. } => path,
            Self::Object { url, .. } => url,
        }
    }
}

/// 留言实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    /// 作者引用
    pub user_id: Uuid,
    /// 创建时间，只设置一次
    pub created_at: DateTime<Utc>,
    /// 附件，只能在创建时设置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDescriptor>,
}

impl Message {
    /// 创建新留言，文本不能为空
    pub fn create(
        id: Uuid,
        text: String,
        user_id: Uuid,
        now: DateTime<Utc>,
        attachment: Option<AttachmentDescriptor>,
    ) -> DomainResult<Self> {
        validate_text(&text)?;
        Ok(Self {
            id,
            text,
            user_id,
            created_at: now,
            attachment,
        })
    }

    /// 更新留言文本，空文本被拒绝，附件保持不变
    pub fn update_text(&mut self, text: String) -> DomainResult<()> {
        validate_text(&text)?;
        self.text = text;
        Ok(())
    }
}

fn validate_text(text: &str) -> DomainResult<()> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("Text is required"));
    }
    Ok(())
}
