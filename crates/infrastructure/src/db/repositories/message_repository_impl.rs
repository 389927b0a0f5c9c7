//! 留言Repository实现
//!
//! 附件描述符以 JSONB 形式存储，两个存储后端变体共用同一张表。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    AttachmentDescriptor, DomainError, DomainResult, Message, MessageRepository, UserMessageStats,
};
use sqlx::{query, query_as, FromRow, PgPool, Row};
use uuid::Uuid;

/// 数据库留言模型
#[derive(Debug, Clone, FromRow)]
struct DbMessage {
    pub id: Uuid,
    pub text: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub attachment: Option<serde_json::Value>,
}

impl TryFrom<DbMessage> for Message {
    type Error = DomainError;

    fn try_from(db_message: DbMessage) -> Result<Self, Self::Error> {
        let attachment = db_message
            .attachment
            .map(serde_json::from_value::<AttachmentDescriptor>)
            .transpose()
            .map_err(|e| DomainError::database_error(format!("invalid attachment column: {}", e)))?;

        Ok(Message {
            id: db_message.id,
            text: db_message.text,
            user_id: db_message.user_id,
            created_at: db_message.created_at,
            attachment,
        })
    }
}

fn attachment_to_json(message: &Message) -> DomainResult<Option<serde_json::Value>> {
    message
        .attachment
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DomainError::database_error(e.to_string()))
}

/// 留言Repository实现
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> DomainResult<Message> {
        let attachment = attachment_to_json(message)?;

        let result = query_as::<_, DbMessage>(
            r#"
            INSERT INTO messages (id, text, user_id, created_at, attachment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, text, user_id, created_at, attachment
            "#,
        )
        .bind(message.id)
        .bind(&message.text)
        .bind(message.user_id)
        .bind(message.created_at)
        .bind(attachment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        result.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Message>> {
        let result = query_as::<_, DbMessage>(
            r#"
            SELECT id, text, user_id, created_at, attachment
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        result.map(Message::try_from).transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Message>> {
        let rows: Vec<DbMessage> = query_as(
            r#"
            SELECT id, text, user_id, created_at, attachment
            FROM messages
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn update(&self, message: &Message) -> DomainResult<Message> {
        let result = query_as::<_, DbMessage>(
            r#"
            UPDATE messages
            SET text = $2
            WHERE id = $1
            RETURNING id, text, user_id, created_at, attachment
            "#,
        )
        .bind(message.id)
        .bind(&message.text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        match result {
            Some(row) => row.try_into(),
            None => Err(DomainError::not_found("Message not found")),
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        let result = query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_total(&self) -> DomainResult<u64> {
        let count: i64 = query("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database_error(e.to_string()))?
            .get(0);

        Ok(count as u64)
    }

    async fn stats_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<UserMessageStats>> {
        let rows = query(
            r#"
            SELECT
                user_id,
                COUNT(*) AS message_count,
                AVG(LENGTH(text))::DOUBLE PRECISION AS avg_text_length
            FROM messages
            WHERE created_at >= $1
            GROUP BY user_id
            ORDER BY message_count DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| UserMessageStats {
                user_id: row.get("user_id"),
                message_count: row.get::<i64, _>("message_count") as u64,
                avg_text_length: row.get::<f64, _>("avg_text_length"),
            })
            .collect())
    }
}
