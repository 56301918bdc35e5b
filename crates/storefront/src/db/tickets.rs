//! Support ticket repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use voltio_core::catalog::{Page, Pagination, like_pattern};
use voltio_core::{TicketId, TicketStatus, TransitionError, UserId};

use super::RepositoryError;
use crate::models::SupportTicket;
use crate::models::ticket::ValidTicket;

const TICKET_COLUMNS: &str = "id, user_id, name, email, subject, message, status, admin_response, \
                              responded_at, created_at, updated_at";

/// Admin ticket listing filters.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    /// Matches subject, name or email.
    pub search: Option<String>,
}

/// Ticket counts by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, sqlx::FromRow)]
pub struct TicketCounts {
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
}

/// Errors from ticket status changes.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<sqlx::Error> for TicketError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new ticket in `abierto`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, ticket: &ValidTicket) -> Result<SupportTicket, RepositoryError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "INSERT INTO shop.support_ticket (user_id, name, email, subject, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket.user_id)
        .bind(&ticket.name)
        .bind(&ticket.email)
        .bind(&ticket.subject)
        .bind(&ticket.message)
        .fetch_one(self.pool)
        .await?;

        Ok(ticket)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TicketId) -> Result<Option<SupportTicket>, RepositoryError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM shop.support_ticket WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(ticket)
    }

    /// A user's own tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<SupportTicket>, RepositoryError> {
        let tickets = sqlx::query_as::<_, SupportTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM shop.support_ticket
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tickets)
    }

    /// List tickets for the admin panel, oldest open work first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &TicketFilter,
        pagination: Pagination,
    ) -> Result<Page<SupportTicket>, RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.support_ticket WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TICKET_COLUMNS} FROM shop.support_ticket WHERE TRUE"
        ));
        push_filters(&mut select, filter);
        select
            .push(
                " ORDER BY CASE status WHEN 'abierto' THEN 0 WHEN 'en_proceso' THEN 1 ELSE 2 END, \
                 created_at ASC, id ASC LIMIT ",
            )
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let items = select
            .build_query_as::<SupportTicket>()
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Record a staff response and move the ticket to `status`.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Transition` if the ticket cannot move to `status`
    /// and `RepositoryError::NotFound` if it does not exist.
    pub async fn respond(
        &self,
        id: TicketId,
        response: &str,
        status: TicketStatus,
    ) -> Result<SupportTicket, TicketError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_status(&mut tx, id).await?;

        // Re-answering keeps the status; closed tickets are final
        let status = if current == status && current != TicketStatus::Closed {
            status
        } else {
            current.transition(status)?
        };

        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "UPDATE shop.support_ticket
             SET admin_response = $2, responded_at = NOW(), status = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(response)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ticket)
    }

    /// Move a ticket to `next` without responding.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Transition` for an illegal change and
    /// `RepositoryError::NotFound` if the ticket does not exist.
    pub async fn update_status(
        &self,
        id: TicketId,
        next: TicketStatus,
    ) -> Result<SupportTicket, TicketError> {
        let mut tx = self.pool.begin().await?;
        let status = lock_status(&mut tx, id).await?.transition(next)?;

        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "UPDATE shop.support_ticket SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ticket)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<TicketCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, TicketCounts>(
            "SELECT COUNT(*) FILTER (WHERE status = 'abierto') AS open,
                    COUNT(*) FILTER (WHERE status = 'en_proceso') AS in_progress,
                    COUNT(*) FILTER (WHERE status = 'resuelto') AS resolved,
                    COUNT(*) FILTER (WHERE status = 'cerrado') AS closed
             FROM shop.support_ticket",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }
}

async fn lock_status(
    conn: &mut sqlx::PgConnection,
    id: TicketId,
) -> Result<TicketStatus, TicketError> {
    let status = sqlx::query_scalar::<_, TicketStatus>(
        "SELECT status FROM shop.support_ticket WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    status.ok_or_else(|| RepositoryError::NotFound.into())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TicketFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (subject ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
