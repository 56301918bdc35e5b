//! Support tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use voltio_core::validation::{self, FieldErrors};
use voltio_core::{Email, TicketId, TicketStatus, UserId};

use super::CurrentUser;

/// A customer inquiry and the staff response to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SupportTicket {
    pub id: TicketId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: String,
    pub message: String,
}

/// Ticket fields ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTicket {
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}

impl NewTicket {
    /// Validate the form. Signed-in users may omit name and email.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self, user: Option<&CurrentUser>) -> Result<ValidTicket, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = match (self.name.as_deref().map(str::trim), user) {
            (Some(name), _) if !name.is_empty() => {
                errors.check("name", validation::required(name, 100))
            }
            (_, Some(user)) => Some(user.name.clone()),
            _ => errors.check("name", validation::required("", 100)),
        };
        let email = match (self.email.as_deref().map(str::trim), user) {
            (Some(email), _) if !email.is_empty() => {
                errors.check("email", validation::email(email))
            }
            (_, Some(user)) => Some(user.email.clone()),
            _ => errors.check("email", validation::email("")),
        };
        let subject = errors.check("subject", validation::required(&self.subject, 150));
        let message = errors.check("message", validation::required(&self.message, 5000));

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) if errors.is_empty() => {
                Ok(ValidTicket {
                    user_id: user.map(|u| u.id),
                    name,
                    email,
                    subject,
                    message,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use voltio_core::UserRole;

    use super::*;

    fn signed_in() -> CurrentUser {
        CurrentUser {
            id: UserId::new(4),
            email: Email::parse("marta@example.com").unwrap(),
            name: "Marta".to_owned(),
            role: UserRole::Customer,
        }
    }

    #[test]
    fn test_guest_must_identify() {
        let form = NewTicket {
            subject: "Garantía".to_owned(),
            message: "¿Cuánto dura la garantía de la batería?".to_owned(),
            ..NewTicket::default()
        };
        let errors = form.validate(None).unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_signed_in_user_fills_identity() {
        let form = NewTicket {
            subject: "Entrega".to_owned(),
            message: "¿Cuándo llega mi pedido?".to_owned(),
            ..NewTicket::default()
        };
        let ticket = form.validate(Some(&signed_in())).unwrap();
        assert_eq!(ticket.user_id, Some(UserId::new(4)));
        assert_eq!(ticket.email.as_str(), "marta@example.com");
        assert_eq!(ticket.name, "Marta");
    }

    #[test]
    fn test_explicit_contact_overrides_profile() {
        let form = NewTicket {
            email: Some("otra@example.com".to_owned()),
            subject: "Factura".to_owned(),
            message: "Necesito factura".to_owned(),
            ..NewTicket::default()
        };
        let ticket = form.validate(Some(&signed_in())).unwrap();
        assert_eq!(ticket.email.as_str(), "otra@example.com");
    }

    #[test]
    fn test_blank_message_rejected() {
        let form = NewTicket {
            name: Some("Ana".to_owned()),
            email: Some("ana@example.com".to_owned()),
            subject: "Hola".to_owned(),
            message: "   ".to_owned(),
        };
        assert!(form.validate(None).unwrap_err().get("message").is_some());
    }
}
