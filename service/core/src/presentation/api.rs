// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! HTTP surface
//!
//! Two entry points share the same services: the chat endpoint, which goes
//! through NLU and the intent dispatcher, and the resource API, which calls
//! the list/expense/notification operations directly.

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use crate::application::envelope::ResponseEnvelope;
use crate::application::error::DispatchError;
use crate::application::notification_emitter::Change;
use crate::application::services::ExpensaServices;
use crate::domain::expense::{ExpenseId, ExpensePatch};
use crate::domain::expenses_list::ListId;
use crate::domain::notification::NotificationId;
use crate::domain::user::UserId;
use crate::infrastructure::event_bus::EventBus;

/// Header carrying the caller's user id on resource calls
pub const USER_HEADER: &str = "x-user-id";

pub struct AppState {
    pub services: ExpensaServices,
    pub event_bus: EventBus,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(services: ExpensaServices, event_bus: EventBus) -> Self {
        Self {
            services,
            event_bus,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/dialogflow", post(chat_handler))
        .route("/api/lists", get(list_lists).post(create_list))
        .route("/api/lists/{id}", put(rename_list).delete(delete_list))
        .route("/api/expenses", get(list_expenses).post(create_expense))
        .route(
            "/api/expenses/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/stream", get(stream_notifications))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Resource API failure rendered in the same envelope shape as chat failures
pub struct ApiError(DispatchError);

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            DispatchError::Upstream(cause) => error!(cause = %cause, "Resource request failed upstream"),
            other => warn!(error = %other, "Resource request rejected"),
        }
        ResponseEnvelope::failure(None, &self.0).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Caller identity taken from the `x-user-id` header
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers)?
            .map(Caller)
            .ok_or(ApiError(DispatchError::Unauthenticated))
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Option<UserId>, DispatchError> {
    let raw = match headers.get(USER_HEADER).and_then(|v| v.to_str().ok()) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };
    UserId::from_string(raw).map(Some).map_err(|_| DispatchError::Validation {
        message: format!("{} must be a UUID.", USER_HEADER),
        fields: vec![USER_HEADER.to_string()],
    })
}

fn parse_id<T>(raw: &str, field: &str, parse: fn(&str) -> Result<T, uuid::Error>) -> Result<T, DispatchError> {
    parse(raw).map_err(|_| DispatchError::Validation {
        message: format!("{} must be a UUID.", field),
        fields: vec![field.to_string()],
    })
}

async fn notify(state: &AppState, change: &Change) {
    let report = state.services.emitter.emit_change(change).await;
    if !report.persist_failures.is_empty() || report.publish_failed() {
        warn!(
            kind = %change.kind,
            persist_failures = report.persist_failures.len(),
            publish_failed = report.publish_failed(),
            "Notification fan-out incomplete"
        );
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "nlu_sessions": state.services.conversation.sessions().len(),
        "stream_subscribers": state.event_bus.subscriber_count(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> ResponseEnvelope {
    state
        .services
        .conversation
        .handle(&request.message, request.user_id.as_deref())
        .await
}

#[derive(Debug, Deserialize)]
pub struct ListBody {
    pub name: String,
}

async fn list_lists(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.lists.read_all().await?))
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<ListBody>,
) -> ApiResult<impl IntoResponse> {
    let created = state.services.lists.create(&body.name, caller).await?;
    notify(&state, &created.change).await;
    let view = state.services.lists.view(&created.value).await;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn rename_list(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Json(body): Json<ListBody>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id", ListId::from_string)?;
    let renamed = state.services.lists.rename(id, &body.name, caller).await?;
    notify(&state, &renamed.change).await;
    Ok(Json(state.services.lists.view(&renamed.value.list).await))
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id", ListId::from_string)?;
    let deleted = state.services.lists.delete(id, caller).await?;
    notify(&state, &deleted.change).await;
    Ok(Json(json!({
        "id": deleted.value.list.id,
        "name": deleted.value.list.name,
        "expensesRemoved": deleted.value.expenses_removed,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub list_id: Option<String>,
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let expenses = match query.list_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => {
            let list_id = parse_id(raw, "listId", ListId::from_string)?;
            state.services.expenses.read_by_list(list_id).await?
        }
        None => state.services.expenses.read_all().await?,
    };
    Ok(Json(expenses))
}

async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id", ExpenseId::from_string)?;
    let expense = state.services.expenses.get(id).await?;
    Ok(Json(state.services.expenses.view(&expense).await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseBody {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub list_id: Option<String>,
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<CreateExpenseBody>,
) -> ApiResult<impl IntoResponse> {
    let raw_list = body
        .list_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| DispatchError::Validation {
            message: "listId is required.".to_string(),
            fields: vec!["listId".to_string()],
        })?;
    let list_id = parse_id(raw_list, "listId", ListId::from_string)?;

    let created = state
        .services
        .expenses
        .create(&body.name, body.amount, list_id, caller)
        .await?;
    notify(&state, &created.change).await;
    let view = state.services.expenses.view(&created.value.expense).await;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_expense(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Json(patch): Json<ExpensePatch>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id", ExpenseId::from_string)?;
    let updated = state.services.expenses.update(id, patch, caller).await?;
    notify(&state, &updated.change).await;
    Ok(Json(state.services.expenses.view(&updated.value).await))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id", ExpenseId::from_string)?;
    let list_hint = match query.list_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_id(raw, "listId", ListId::from_string)?),
        None => None,
    };
    let deleted = state.services.expenses.delete(id, list_hint, caller).await?;
    notify(&state, &deleted.change).await;
    Ok(Json(json!({
        "id": deleted.value.expense.id,
        "listId": deleted.value.expense.list_id,
    })))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.emitter.list_for_user(caller).await?))
}

async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id", NotificationId::from_string)?;
    Ok(Json(state.services.emitter.mark_read(caller, id).await?))
}

/// Server-sent notification feed. With an `x-user-id` header only events
/// naming that user as a recipient are forwarded.
async fn stream_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let filter = caller_from_headers(&headers)?;
    let stream = BroadcastStream::new(state.event_bus.raw_subscribe()).filter_map(move |item| {
        match item {
            Ok(event) => {
                if filter.is_some_and(|user| !event.concerns(&user)) {
                    return None;
                }
                match Event::default().event(event.event.clone()).json_data(&event.payload) {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        warn!(error = %e, "Failed to encode notification for stream");
                        None
                    }
                }
            }
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!(skipped = n, "Notification stream lagged");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
