//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and store backend |
//! | `POST` | `/api/sow` | Store a new SOW version |
//! | `GET` | `/api/sow/{lead_id}/latest` | Latest version of a lead |
//! | `GET` | `/api/sow/{lead_id}/versions` | All versions, newest first |
//! | `GET` | `/api/sow/{lead_id}/document` | Generated document (`?format=markdown`) |
//! | `GET` | `/api/records` | Paged records across all leads |
//! | `GET` | `/api/records/{id}` | Single record by id |
//! | `POST` | `/api/meetings` | Store parsed meeting answers |
//! | `GET` | `/api/meetings/{meeting_id}/answers` | Stored meeting answers |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use scribe_core::{EventParser, parse_store_trigger, render_markdown};
use scribe_db::{DEFAULT_PAGE_LIMIT, Page};
use scribe_types::{LeadId, MeetingId, RecordId, StoreReceipt};
use serde_json::Value;

use crate::document::generate_document;
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/records` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct RecordsQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Rows per page (default 10).
    pub limit: Option<u32>,
    /// Column to sort by (default `id`).
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `asc`).
    pub order: Option<String>,
}

/// Query parameters for the document endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct DocumentQuery {
    /// `json` (default) or `markdown`.
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness, the active store backend and whether it is reachable.
///
/// Always 200; an unreachable database reports `"status": "degraded"`.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            "degraded"
        }
    };
    Json(serde_json::json!({
        "status": status,
        "backend": state.store.backend_name(),
        "rewriter": state.rewriter.name(),
    }))
}

// ---------------------------------------------------------------------------
// SOW versions
// ---------------------------------------------------------------------------

/// Validate a SOW event and append it as the lead's next version.
pub async fn store_sow(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<StoreReceipt>, ApiError> {
    let Json(raw) = body?;
    let new = parse_store_trigger(raw).inspect_err(|e| {
        tracing::warn!(error = %e, "rejected SOW event");
    })?;

    let record = state.store.insert_version(&new).await?;
    Ok(Json(StoreReceipt::for_record(&record)))
}

/// Return the latest version of a lead.
pub async fn get_latest(
    State(state): State<Arc<AppState>>,
    lead: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(lead) = lead?;
    let lead_id = parse_lead_id(&lead)?;
    let record = state
        .store
        .get_latest(&lead_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no SOW versions for lead {lead_id}")))?;
    Ok(Json(record))
}

/// Return every version of a lead, newest first.
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    lead: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(lead) = lead?;
    let lead_id = parse_lead_id(&lead)?;
    let versions = state.store.list_versions(&lead_id).await?;
    if versions.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no SOW versions for lead {lead_id}"
        )));
    }
    Ok(Json(serde_json::json!({
        "lead_id": lead_id,
        "count": versions.len(),
        "versions": versions,
    })))
}

/// Generate the document for a lead's latest version.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    lead: Result<Path<String>, PathRejection>,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(lead) = lead?;
    let Query(query) = query?;
    let lead_id = parse_lead_id(&lead)?;
    let markdown = match query.format.as_deref() {
        None | Some("json") => false,
        Some("markdown" | "md") => true,
        Some(other) => {
            return Err(ApiError::InvalidQuery(format!(
                "unsupported format '{other}', use json or markdown"
            )));
        }
    };

    let document = generate_document(&state, &lead_id).await?;
    if markdown {
        let text = render_markdown(&document.body);
        return Ok((
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            text,
        )
            .into_response());
    }
    Ok(Json(document).into_response())
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Page through all records across every lead.
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let descending = match query.order.as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            return Err(ApiError::InvalidQuery(format!(
                "invalid order '{other}', use asc or desc"
            )));
        }
    };
    let page = Page {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        sort_by: query.sort_by,
        descending,
    };

    let result = state.store.list_records(&page).await?;
    Ok(Json(serde_json::json!({
        "page": page.page,
        "limit": page.limit,
        "total_count": result.total_count,
        "items": result.items,
    })))
}

/// Return a single record by id.
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id_str) = id?;
    let id = id_str
        .parse::<i64>()
        .map(RecordId)
        .map_err(|e| ApiError::InvalidQuery(format!("invalid record id '{id_str}': {e}")))?;
    let record = state
        .store
        .get_version(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("record {id}")))?;
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

/// Parse a meeting answer event and persist its answers.
pub async fn store_meeting_answers(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(raw) = body?;
    let parsed = EventParser::parse(&raw).inspect_err(|e| {
        tracing::warn!(error = %e, "rejected meeting event");
    })?;

    let stored = state.store.save_meeting_answers(&parsed).await?;
    tracing::info!(
        meeting_id = %parsed.meeting_id,
        stored,
        "Stored meeting answers"
    );
    Ok(Json(serde_json::json!({
        "meeting_id": parsed.meeting_id,
        "stored": stored,
        "answers": parsed.answers,
    })))
}

/// Return the stored answers of a meeting.
pub async fn get_meeting_answers(
    State(state): State<Arc<AppState>>,
    meeting: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(meeting) = meeting?;
    let meeting_id =
        MeetingId::new(meeting).map_err(|e| ApiError::InvalidQuery(e.to_string()))?;
    let answers = state.store.meeting_answers(&meeting_id).await?;
    if answers.is_empty() {
        return Err(ApiError::NotFound(format!("meeting {meeting_id}")));
    }
    Ok(Json(serde_json::json!({
        "meeting_id": meeting_id,
        "count": answers.len(),
        "answers": answers,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_lead_id(raw: &str) -> Result<LeadId, ApiError> {
    LeadId::new(raw).map_err(|e| ApiError::InvalidQuery(e.to_string()))
}
