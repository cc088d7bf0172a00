//! Identity gate in front of the dashboard.

use async_trait::async_trait;

use crate::error::ValidationError;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// Decides whether a login attempt may enter the session.
///
/// The default [`AcceptAnyIdentifier`] performs no credential check; a real
/// verifier can be swapped in without touching the session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Identity, ValidationError>;
}

/// Accepts any non-blank identifier and ignores the secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyIdentifier;

#[async_trait]
impl Authenticator for AcceptAnyIdentifier {
    async fn authenticate(&self, identifier: &str, _secret: &str) -> Result<Identity, ValidationError> {
        let username = identifier.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyIdentifier);
        }
        Ok(Identity {
            username: username.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_identifier_is_rejected() {
        let err = AcceptAnyIdentifier.authenticate("   ", "secret").await.unwrap_err();
        assert_eq!(err, ValidationError::EmptyIdentifier);
    }

    #[tokio::test]
    async fn test_secret_is_not_checked() {
        let identity = AcceptAnyIdentifier.authenticate(" alice ", "").await.unwrap();
        assert_eq!(identity.username, "alice");
    }
}
