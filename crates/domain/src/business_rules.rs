//! 业务规则验证
//!
//! 留言板的纯函数业务规则：发帖时间窗口和上传文件校验。
//! 不依赖任何 I/O，便于单独测试。

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Datelike, Utc, Weekday};

/// 上传大小上限：5 MiB
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// 允许的文件扩展名
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "pdf"];

/// 允许的 MIME 类型
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// 发帖时间窗口规则
pub struct PostingWindowRules;

impl PostingWindowRules {
    /// 验证当前时间是否允许写操作
    ///
    /// 只依赖墙钟时间的星期，与用户或资源无关。
    pub fn posting_allowed(now: DateTime<Utc>, restricted_days: &[Weekday]) -> DomainResult<()> {
        let today = now.weekday();
        if restricted_days.contains(&today) {
            return Err(DomainError::forbidden(format!(
                "Posting is not allowed on {}",
                today
            )));
        }
        Ok(())
    }
}

/// 上传文件校验规则
pub struct UploadRules;

impl UploadRules {
    /// 验证上传文件
    ///
    /// 扩展名和声明的 MIME 类型都必须在允许列表中，任一不满足即拒绝。
    pub fn validate_upload(
        original_name: &str,
        declared_mime: &str,
        size: usize,
    ) -> DomainResult<()> {
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| DomainError::validation("File has no extension"))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DomainError::validation(format!(
                "File extension .{} is not allowed",
                extension
            )));
        }

        if !ALLOWED_MIME_TYPES.contains(&declared_mime) {
            return Err(DomainError::validation(format!(
                "MIME type {} is not allowed",
                declared_mime
            )));
        }

        if size > MAX_UPLOAD_BYTES {
            return Err(DomainError::validation(format!(
                "File exceeds the maximum size of {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        Ok(())
    }
}
