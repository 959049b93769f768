//! Authorization hook for room creation.
//!
//! Only hosts need credentials; players join with nothing but a room code.
//! The server calls [`Authenticator::authorize`] with the credential from a
//! `CreateRoom` event before any room state is allocated.

use crate::SessionError;

/// Decides whether a room-creation credential is acceptable.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the lifetime of the server.
///
/// # Example
///
/// ```rust
/// use bingo_session::{Authenticator, SessionError};
///
/// /// Lets anyone host. Development only.
/// struct OpenDoor;
///
/// impl Authenticator for OpenDoor {
///     async fn authorize(&self, _credential: &str) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Accepts or rejects a credential.
    ///
    /// # Errors
    /// [`SessionError::Unauthorized`] when the credential is rejected.
    fn authorize(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
}

/// One shared admin password for the whole server.
#[derive(Clone)]
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    /// Wraps the configured secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl Authenticator for SharedSecret {
    async fn authorize(&self, credential: &str) -> Result<(), SessionError> {
        if constant_time_eq(self.secret.as_bytes(), credential.as_bytes()) {
            Ok(())
        } else {
            tracing::debug!("room creation rejected: bad credential");
            Err(SessionError::Unauthorized)
        }
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
