use merchcoin_auth::AuthError;
use merchcoin_db::DbError;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("invalid recipient")]
    InvalidRecipient,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("storage error: {0}")]
    Storage(DbError),

    #[error("operation timed out")]
    Timeout,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount
            | Self::InvalidRecipient
            | Self::InsufficientFunds
            | Self::RecipientNotFound(_)
            | Self::ItemNotFound(_) => 400,
            Self::InvalidCredentials => 401,
            Self::Storage(_) => 500,
            Self::Timeout => 504,
            Self::Auth(e) => e.status_code(),
        }
    }

    /// Message safe to return to a client
    pub fn client_message(&self) -> String {
        match self {
            Self::Storage(_) => "internal server error".to_string(),
            Self::Auth(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UnknownRecipient(name) => Self::RecipientNotFound(name),
            DbError::InsufficientBalance { .. } => Self::InsufficientFunds,
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LedgerError::InvalidAmount.status_code(), 400);
        assert_eq!(LedgerError::ItemNotFound("yacht".into()).status_code(), 400);
        assert_eq!(LedgerError::InvalidCredentials.status_code(), 401);
        assert_eq!(LedgerError::Auth(AuthError::TokenExpired).status_code(), 401);
        assert_eq!(
            LedgerError::Storage(DbError::Connection("down".into())).status_code(),
            500
        );
        assert_eq!(LedgerError::Timeout.status_code(), 504);
    }

    #[test]
    fn test_db_error_mapping() {
        assert!(matches!(
            LedgerError::from(DbError::UnknownRecipient("bob".into())),
            LedgerError::RecipientNotFound(name) if name == "bob"
        ));
        assert!(matches!(
            LedgerError::from(DbError::InsufficientBalance { available: 1, required: 2 }),
            LedgerError::InsufficientFunds
        ));
        assert!(matches!(
            LedgerError::from(DbError::NotFound("user 9".into())),
            LedgerError::Storage(_)
        ));
    }

    #[test]
    fn test_storage_details_hidden() {
        let err = LedgerError::Storage(DbError::Connection("10.0.0.5 refused".into()));
        assert_eq!(err.client_message(), "internal server error");
    }
}
