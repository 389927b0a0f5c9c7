//! WebSocket 实时推送
//!
//! 握手阶段用和 HTTP 相同的 JWT 验证方式校验 token，校验失败
//! 时连接不会建立。连接建立后没有房间概念，所有客户端收到全部
//! `newMessage` 事件；断开的客户端错过的事件不会补发。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::CreateMessageRequest;

use crate::{error::ApiError, routes::MessageDto, state::AppState};

/// WebSocket连接查询参数
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// JWT access token
    pub token: String,
}

/// 服务端推送的事件
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ServerEvent {
    #[serde(rename = "newMessage")]
    NewMessage { message: MessageDto },
}

/// 客户端发来的事件（早期协议变体，可选）
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientEvent {
    #[serde(rename = "newMessage")]
    NewMessage { text: String },
}

/// 处理WebSocket连接升级
///
/// token 无效时直接拒绝升级请求，连接不会进入广播通道。
pub async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user_id = state.jwt_service.verify(&query.token)?;

    tracing::info!(%user_id, "websocket upgrade");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// 连接生命周期：订阅广播、转发事件、处理客户端帧
///
/// user_id 只用于日志标记，不影响该连接收到哪些广播。
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut events = state.broadcaster.subscribe();
    let (mut sender, mut incoming) = socket.split();

    let mut send_task = tokio::spawn(async move {
        // 落后太多的订阅者会收到 Lagged 错误并被移出事件流
        while let Ok(event) = events.recv().await {
            let payload = ServerEvent::NewMessage {
                message: MessageDto::from(&event.message),
            };
            let json = match serde_json::to_string(&payload) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize websocket payload");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = incoming.next().await {
            match frame {
                WsMessage::Text(text) => {
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(ClientEvent::NewMessage { text }) => {
                            // 走和 HTTP 相同的创建路径，成功后会广播回所有客户端
                            if let Err(err) = recv_state
                                .message_service
                                .create(CreateMessageRequest { text, user_id })
                                .await
                            {
                                tracing::warn!(%user_id, error = %err, "websocket message rejected");
                            }
                        }
                        Err(err) => {
                            tracing::debug!(%user_id, error = %err, "unrecognized websocket frame");
                        }
                    }
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::info!(%user_id, "websocket client disconnected");
}
