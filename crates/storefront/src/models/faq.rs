//! Frequently asked questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use voltio_core::FaqId;
use voltio_core::validation::{self, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    /// Ascending sort key within the list.
    pub position: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin create/update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

const fn default_published() -> bool {
    true
}

impl FaqInput {
    /// Validate and trim the payload.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(mut self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(question) = errors.check("question", validation::required(&self.question, 300)) {
            self.question = question;
        }
        if let Some(answer) = errors.check("answer", validation::required(&self.answer, 5000)) {
            self.answer = answer;
        }
        self.category = errors
            .check("category", validation::optional(self.category.as_deref(), 50))
            .flatten()
            .map(|c| c.to_lowercase());

        errors.into_result()?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_lowercases_category() {
        let faq = FaqInput {
            question: " ¿Cuánto tarda la carga? ".to_owned(),
            answer: "Entre 4 y 8 horas.".to_owned(),
            category: Some(" Carga ".to_owned()),
            position: 1,
            published: true,
        }
        .validate()
        .unwrap();
        assert_eq!(faq.question, "¿Cuánto tarda la carga?");
        assert_eq!(faq.category.as_deref(), Some("carga"));
    }

    #[test]
    fn test_missing_answer() {
        let errors = FaqInput {
            question: "¿Envían a todo el país?".to_owned(),
            answer: String::new(),
            category: None,
            position: 0,
            published: false,
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("answer").is_some());
    }
}
