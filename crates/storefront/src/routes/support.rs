//! Support ticket submission and history.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use crate::db::TicketRepository;
use crate::error::{Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{NewTicket, SupportTicket};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/support", post(create))
        .route("/support/mine", get(mine))
}

/// Open a ticket. Guests must give a name and email; signed-in users
/// default to their profile.
#[instrument(skip(state, user, form))]
async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(form): Json<NewTicket>,
) -> Result<(StatusCode, Json<SupportTicket>)> {
    let ticket = form.validate(user.as_ref())?;
    let ticket = TicketRepository::new(state.pool()).create(&ticket).await?;

    add_breadcrumb("support", "Ticket submitted", None);
    tracing::info!(ticket_id = %ticket.id, guest = user.is_none(), "support ticket opened");
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<SupportTicket>>> {
    let tickets = TicketRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(tickets))
}
