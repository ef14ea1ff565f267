//! Room-specific error taxonomy.
//!
//! Every failure a connection can trigger maps to exactly one variant, and
//! every variant maps to a stable [`ErrorCode`] for the acknowledgment.

use thiserror::Error;

use crate::domain::foundation::{AuthError, ErrorCode, ValidationError};

use super::{RoomStatus, TeamId};

/// Errors produced while validating or applying a room operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Missing or malformed input.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Room or user absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Player roster already at capacity.
    #[error("Room is full ({capacity} players)")]
    Capacity { capacity: u8 },

    /// Operation invalid for the room's current status.
    #[error("Cannot {operation} while room is {status}")]
    Phase {
        status: RoomStatus,
        operation: String,
    },

    /// A captain tried to pick out of turn.
    #[error("It is team {expected}'s turn to pick, not team {attempted}'s")]
    TurnOrder { expected: TeamId, attempted: TeamId },

    /// Actor lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Duplicate or irreconcilable membership state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credential rejected by the auth provider.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A collaborator (store, notifier) failed.
    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl RoomError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RoomError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        RoomError::NotFound(what.into())
    }

    pub fn phase(status: RoomStatus, operation: impl Into<String>) -> Self {
        RoomError::Phase {
            status,
            operation: operation.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        RoomError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RoomError::Conflict(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        RoomError::Infrastructure(message.into())
    }

    /// Stable code for the acknowledgment.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::Validation { .. } => ErrorCode::ValidationFailed,
            RoomError::NotFound(_) => ErrorCode::NotFound,
            RoomError::Capacity { .. } => ErrorCode::RoomFull,
            RoomError::Phase { .. } => ErrorCode::InvalidPhase,
            RoomError::TurnOrder { .. } => ErrorCode::NotYourTurn,
            RoomError::Forbidden(_) => ErrorCode::Forbidden,
            RoomError::Conflict(_) => ErrorCode::Conflict,
            RoomError::Unauthorized(_) => ErrorCode::Unauthorized,
            RoomError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Taxonomy name reported alongside the code.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::Validation { .. } => "ValidationError",
            RoomError::NotFound(_) => "NotFoundError",
            RoomError::Capacity { .. } => "CapacityError",
            RoomError::Phase { .. } => "PhaseError",
            RoomError::TurnOrder { .. } => "TurnOrderError",
            RoomError::Forbidden(_) => "ForbiddenError",
            RoomError::Conflict(_) => "ConflictError",
            RoomError::Unauthorized(_) => "UnauthorizedError",
            RoomError::Infrastructure(_) => "InternalError",
        }
    }
}

impl From<ValidationError> for RoomError {
    fn from(err: ValidationError) -> Self {
        RoomError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AuthError> for RoomError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ServiceUnavailable(msg) => RoomError::Infrastructure(msg),
            other => RoomError::Unauthorized(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_variant_has_distinct_code() {
        let errors = [
            RoomError::validation("name", "too short"),
            RoomError::not_found("Room"),
            RoomError::Capacity { capacity: 10 },
            RoomError::phase(RoomStatus::Gaming, "switch roles"),
            RoomError::TurnOrder {
                expected: TeamId::ONE,
                attempted: TeamId::TWO,
            },
            RoomError::forbidden("not captain"),
            RoomError::conflict("already a player"),
            RoomError::Unauthorized("bad token".into()),
            RoomError::infrastructure("store down"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn phase_error_mentions_status_and_operation() {
        let err = RoomError::phase(RoomStatus::SidePicking, "pick players");
        assert_eq!(
            err.to_string(),
            "Cannot pick players while room is side_picking"
        );
        assert_eq!(err.kind(), "PhaseError");
    }

    #[test]
    fn validation_error_converts_with_field() {
        let err: RoomError = ValidationError::empty_field("content").into();
        assert!(matches!(err, RoomError::Validation { ref field, .. } if field == "content"));
    }

    #[test]
    fn transient_auth_errors_are_infrastructure() {
        let err: RoomError = AuthError::ServiceUnavailable("timeout".into()).into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        let err: RoomError = AuthError::InvalidToken.into();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
