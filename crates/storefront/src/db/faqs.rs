//! FAQ repository.

use sqlx::PgPool;

use voltio_core::FaqId;

use super::RepositoryError;
use crate::models::{Faq, FaqInput};

const FAQ_COLUMNS: &str = "id, question, answer, category, position, published, created_at, updated_at";

pub struct FaqRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FaqRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published entries, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self, category: Option<&str>) -> Result<Vec<Faq>, RepositoryError> {
        let faqs = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {FAQ_COLUMNS} FROM shop.faq
             WHERE published AND ($1::TEXT IS NULL OR category = LOWER($1))
             ORDER BY position, id"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(faqs)
    }

    /// Every entry, including drafts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Faq>, RepositoryError> {
        let faqs = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {FAQ_COLUMNS} FROM shop.faq ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(faqs)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &FaqInput) -> Result<Faq, RepositoryError> {
        let faq = sqlx::query_as::<_, Faq>(&format!(
            "INSERT INTO shop.faq (question, answer, category, position, published)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FAQ_COLUMNS}"
        ))
        .bind(&input.question)
        .bind(&input.answer)
        .bind(&input.category)
        .bind(input.position)
        .bind(input.published)
        .fetch_one(self.pool)
        .await?;

        Ok(faq)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry does not exist.
    pub async fn update(&self, id: FaqId, input: &FaqInput) -> Result<Faq, RepositoryError> {
        let faq = sqlx::query_as::<_, Faq>(&format!(
            "UPDATE shop.faq
             SET question = $2, answer = $3, category = $4, position = $5, published = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {FAQ_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.question)
        .bind(&input.answer)
        .bind(&input.category)
        .bind(input.position)
        .bind(input.published)
        .fetch_optional(self.pool)
        .await?;

        faq.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry does not exist.
    pub async fn delete(&self, id: FaqId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.faq WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
