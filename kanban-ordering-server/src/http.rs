//! JSON-over-HTTP routes
//!
//! Each handler turns its path, query and body into one engine command and runs it through an
//! [`OrderingProcessor`]. The caller may name itself with an `x-actor` header; logged commands
//! are attributed to it. Malformed bodies are answered in the same `{"error": ...}` shape as
//! engine failures.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use kanban_ordering::container::{
    AddContainer, ListContainers, ListItems, ReindexContainer, VerifyContainer,
};
use kanban_ordering::item::{InsertAtEnd, MoveItem, RemoveItem};
use kanban_ordering::{
    ContainerId, ContainerKind, Execute, ItemId, ItemKind, OrderingContext, OrderingError,
    OrderingProcessor,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Header naming who issued a request
pub const ACTOR_HEADER: &str = "x-actor";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    ctx: Arc<OrderingContext>,
}

impl AppState {
    pub fn new(ctx: Arc<OrderingContext>) -> Self {
        Self { ctx }
    }

    /// Run one command on behalf of the request's actor
    async fn run<Op>(&self, headers: &HeaderMap, op: Op) -> Result<Value, ApiError>
    where
        Op: Execute<OrderingContext, OrderingError>,
    {
        let processor = match headers.get(ACTOR_HEADER).and_then(|v| v.to_str().ok()) {
            Some(actor) if !actor.is_empty() => OrderingProcessor::with_actor(actor),
            _ => OrderingProcessor::new(),
        };
        Ok(processor.process(&op, &self.ctx).await?)
    }
}

/// Build the router over a context
pub fn router(ctx: Arc<OrderingContext>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/containers", get(list_containers).post(add_container))
        .route(
            "/api/containers/:id/items",
            get(list_items).post(insert_item),
        )
        .route("/api/containers/:id/reindex", post(reindex_container))
        .route("/api/containers/:id/verify", get(verify_container))
        .route("/api/items/:id/move", post(move_item))
        .route("/api/items/:id", delete(remove_item))
        .route("/api/activity", get(activity))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(ctx))
}

/// Health check handler for the /health endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
struct KindFilter {
    kind: Option<ContainerKind>,
}

async fn list_containers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<KindFilter>,
) -> Result<Json<Value>, ApiError> {
    let op = ListContainers { kind: filter.kind };
    Ok(Json(state.run(&headers, op).await?))
}

async fn add_container(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AddContainer>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(op) = body?;
    let created = state.run(&headers, op).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.run(&headers, ListItems::new(id)).await?))
}

#[derive(Debug, Deserialize)]
struct InsertBody {
    #[serde(default)]
    id: Option<ItemId>,
    title: String,
    #[serde(default)]
    kind: Option<ItemKind>,
}

async fn insert_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<InsertBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let op = InsertAtEnd {
        container: ContainerId::from(id),
        id: body.id,
        title: body.title,
        kind: body.kind,
    };
    let inserted = state.run(&headers, op).await?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

async fn reindex_container(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.run(&headers, ReindexContainer::new(id)).await?))
}

async fn verify_container(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.run(&headers, VerifyContainer::new(id)).await?))
}

/// Move request body; the item comes from the path
#[derive(Debug, Deserialize)]
struct MoveBody {
    #[serde(default, alias = "column_id", alias = "container_id")]
    container: Option<ContainerId>,
    #[serde(alias = "order_index", alias = "order")]
    position: i64,
    #[serde(default)]
    expected_position: Option<usize>,
}

async fn move_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let op = MoveItem {
        id: ItemId::from(id),
        container: body.container,
        position: body.position,
        expected_position: body.expected_position,
    };
    Ok(Json(state.run(&headers, op).await?))
}

#[derive(Debug, Default, Deserialize)]
struct RemoveQuery {
    expected_position: Option<usize>,
}

async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<Value>, ApiError> {
    let op = RemoveItem {
        id: ItemId::from(id),
        expected_position: query.expected_position,
    };
    Ok(Json(state.run(&headers, op).await?))
}

#[derive(Debug, Default, Deserialize)]
struct ActivityQuery {
    limit: Option<usize>,
}

async fn activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Value>, ApiError> {
    let entries = state.ctx.read_activity(query.limit).await?;
    Ok(Json(json!({
        "count": entries.len(),
        "entries": entries,
    })))
}
