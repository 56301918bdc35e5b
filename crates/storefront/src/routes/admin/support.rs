//! Support ticket handling.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use voltio_core::catalog::{Page, Pagination};
use voltio_core::validation::{self, FieldErrors};
use voltio_core::{TicketId, TicketStatus};

use super::search_term;
use crate::db::TicketRepository;
use crate::db::tickets::TicketFilter;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::SupportTicket;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Staff reply. The ticket moves to `status`, `resuelto` by default.
#[derive(Debug, Deserialize)]
pub struct Reply {
    pub response: String,
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: TicketStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/support", get(index))
        .route("/support/{id}", get(show))
        .route("/support/{id}/respond", post(respond))
        .route("/support/{id}/status", put(update_status))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<Page<SupportTicket>>> {
    let filter = TicketFilter {
        status: query.status,
        search: search_term(query.search),
    };
    let page = TicketRepository::new(state.pool())
        .list(&filter, Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id, ticket_id = %id))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<SupportTicket>> {
    TicketRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))
}

#[instrument(skip(admin, state, reply), fields(admin_id = %admin.id, ticket_id = %id))]
async fn respond(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
    Json(reply): Json<Reply>,
) -> Result<Json<SupportTicket>> {
    let mut errors = FieldErrors::new();
    let response = errors.check("response", validation::required(&reply.response, 5000));
    errors.into_result()?;
    let response = response.unwrap_or_default();

    let ticket = TicketRepository::new(state.pool())
        .respond(id, &response, reply.status.unwrap_or(TicketStatus::Resolved))
        .await?;
    tracing::info!(ticket_id = %ticket.id, status = ticket.status.as_str(), "ticket answered");
    Ok(Json(ticket))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id, ticket_id = %id))]
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<SupportTicket>> {
    let ticket = TicketRepository::new(state.pool())
        .update_status(id, change.status)
        .await?;
    Ok(Json(ticket))
}
