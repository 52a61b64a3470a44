//! Notification history and mark-as-read handlers.

use axum::extract::{Path, State};
use hearth_core::types::{Notification, NotificationId};
use hearth_telemetry::metrics::HearthMetrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::Auth;
use crate::response::ApiResponse;
use crate::state::AppState;

/// One notification as the dropdown renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    /// Notification ID
    pub id: NotificationId,
    /// Message text
    pub message: String,
    /// Link, `#` when absent
    pub link: String,
    /// Read flag
    pub is_read: bool,
    /// Creation time, `YYYY-MM-DD HH:MM`
    pub created_at: String,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id(),
            message: n.message().to_string(),
            link: n.link_or_placeholder().to_string(),
            is_read: n.is_read(),
            created_at: n.created_at_display(),
        }
    }
}

/// Body of `GET /notifications/api/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationList {
    /// Most recent notifications, newest first
    pub notifications: Vec<NotificationView>,
    /// Unread count
    pub count: u64,
}

/// Body of `POST /notifications/mark-as-read/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkedRead {
    /// Human-readable summary
    pub message: String,
    /// Notifications flipped to read
    pub updated_count: u64,
}

/// Body of `POST /notifications/{id}/read/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkedOne {
    /// Whether this call changed the notification
    pub updated: bool,
}

/// Lists the caller's recent notifications.
///
/// GET /notifications/api/
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
) -> ApiResult<ApiResponse<NotificationList>> {
    let store = state.store();
    let recent = store
        .list_recent(user.user_id, state.notify.effective_recent_limit())
        .await?;
    let count = store.count_unread(user.user_id).await?;

    Ok(ApiResponse::success(NotificationList {
        notifications: recent.iter().map(NotificationView::from).collect(),
        count,
    }))
}

/// Marks every unread notification of the caller as read.
///
/// POST /notifications/mark-as-read/
pub async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
) -> ApiResult<ApiResponse<MarkedRead>> {
    let updated_count = state.store().mark_all_read(user.user_id).await?;
    HearthMetrics::notifications_marked_read(updated_count);
    info!(user = %user.user_id, updated_count, "Notifications marked read");

    Ok(ApiResponse::success(MarkedRead {
        message: format!("Marked {updated_count} notifications as read"),
        updated_count,
    }))
}

/// Marks a single notification of the caller as read.
///
/// POST /notifications/{id}/read/
pub async fn mark_one_read(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
    Path(raw_id): Path<String>,
) -> ApiResult<ApiResponse<MarkedOne>> {
    let id = raw_id
        .parse::<i64>()
        .ok()
        .and_then(|v| NotificationId::new(v).ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid notification id: {raw_id}")))?;

    let updated = state.store().mark_read(user.user_id, id).await?;
    if updated {
        HearthMetrics::notifications_marked_read(1);
    }

    Ok(ApiResponse::success(MarkedOne { updated }))
}

/// Fallback for unsupported methods on notification routes.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("No such route".to_string())
}
