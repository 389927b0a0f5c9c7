use application::{Mailer, MailerError};
use async_trait::async_trait;

/// 把外发邮件写进日志的开发实现
///
/// 真正的投递渠道是外部协作方，这里只满足 `Mailer` 契约。
#[derive(Debug, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        tracing::info!(to = %to, subject = %subject, body_len = body.len(), "outbound email");
        Ok(())
    }
}
