//! Status and role enums with their Spanish wire names.
//!
//! Every enum here serializes (JSON and, with the `postgres` feature, the
//! matching `shop.*` Postgres enum) to the same lowercase Spanish identifier
//! the storefront clients already use, e.g. `pendiente` or `en_proceso`.

use serde::{Deserialize, Serialize};

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot change status from {from} to {to}")]
pub struct TransitionError {
    /// Current status wire name.
    pub from: &'static str,
    /// Requested status wire name.
    pub to: &'static str,
}

/// Order lifecycle status.
///
/// ```text
/// pendiente ──► en_proceso ──► entregado
///     │              │
///     └──────────────┴──────► cancelado
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.order_status"))]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "en_proceso")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "en_proceso"))]
    Processing,
    #[serde(rename = "entregado")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "entregado"))]
    Delivered,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "cancelado"))]
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Processing => "en_proceso",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the order may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Delivered | Self::Cancelled)
        )
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the move is not part of the lifecycle.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Whether the customer who placed the order may still cancel it.
    #[must_use]
    pub const fn is_customer_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Support ticket status.
///
/// `cerrado` is terminal; a resolved ticket can be reopened into `en_proceso`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.ticket_status"))]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "abierto")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "abierto"))]
    Open,
    #[serde(rename = "en_proceso")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "en_proceso"))]
    InProgress,
    #[serde(rename = "resuelto")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "resuelto"))]
    Resolved,
    #[serde(rename = "cerrado")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "cerrado"))]
    Closed,
}

impl TicketStatus {
    /// All statuses in workflow order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    /// Wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "abierto",
            Self::InProgress => "en_proceso",
            Self::Resolved => "resuelto",
            Self::Closed => "cerrado",
        }
    }

    /// Whether the ticket may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::InProgress | Self::Resolved | Self::Closed)
                | (Self::InProgress, Self::Resolved | Self::Closed)
                | (Self::Resolved, Self::InProgress | Self::Closed)
        )
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the move is not part of the workflow.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid ticket status: {s}"))
    }
}

/// Account role. Only `admin` can reach the back-office routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.user_role"))]
pub enum UserRole {
    #[default]
    #[serde(rename = "cliente")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "cliente"))]
    Customer,
    #[serde(rename = "admin")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "admin"))]
    Admin,
}

impl UserRole {
    /// Wire name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "cliente",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cliente" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// How the customer intends to pay. Recorded on the order, never charged here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.payment_method"))]
pub enum PaymentMethod {
    #[serde(rename = "tarjeta")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "tarjeta"))]
    Card,
    #[serde(rename = "transferencia")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "transferencia"))]
    BankTransfer,
    #[serde(rename = "contra_entrega")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "contra_entrega"))]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Wire name of this payment method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "tarjeta",
            Self::BankTransfer => "transferencia",
            Self::CashOnDelivery => "contra_entrega",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_lifecycle_transitions() {
        use OrderStatus::{Cancelled, Delivered, Pending, Processing};

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Pending));
        for next in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_order_transition_error_names_both_ends() {
        let err = OrderStatus::Delivered
            .transition(OrderStatus::Cancelled)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot change status from entregado to cancelado");
    }

    #[test]
    fn test_only_pending_orders_are_customer_cancellable() {
        assert!(OrderStatus::Pending.is_customer_cancellable());
        assert!(!OrderStatus::Processing.is_customer_cancellable());
    }

    #[test]
    fn test_order_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"en_proceso\""
        );
        assert_eq!("entregado".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_ticket_workflow() {
        use TicketStatus::{Closed, InProgress, Open, Resolved};

        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Resolved));
        assert!(InProgress.can_transition_to(Closed));
        assert!(Resolved.can_transition_to(InProgress));
        assert!(!Resolved.can_transition_to(Open));
        assert!(!Closed.can_transition_to(InProgress));
        assert!(Closed.transition(Open).is_err());
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!(UserRole::Customer.to_string(), "cliente");
        assert!(UserRole::Admin.is_admin());
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_payment_method_wire_names() {
        let method: PaymentMethod = serde_json::from_str("\"contra_entrega\"").unwrap();
        assert_eq!(method, PaymentMethod::CashOnDelivery);
    }
}
