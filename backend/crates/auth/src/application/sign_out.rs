//! Sign Out Use Case
//!
//! Revokes the presented session, and the CSRF token if one came along and
//! belongs to the same user.

use crate::application::auth_service::AuthService;
use crate::application::csrf_service::CsrfService;
use crate::domain::repository::{CsrfRepository, SessionRepository};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

pub struct SignOutUseCase<S> {
    auth: AuthService<S>,
    csrf: CsrfService<S>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository + CsrfRepository + Send + Sync,
{
    pub fn new(auth: AuthService<S>, csrf: CsrfService<S>) -> Self {
        Self { auth, csrf }
    }

    /// Session delete errors propagate. The CSRF delete is best effort.
    pub async fn execute(
        &self,
        session_token: &str,
        csrf_token: Option<&str>,
        user_id: UserId,
    ) -> AuthResult<()> {
        self.auth.log_out(session_token).await?;

        if let Some(token) = csrf_token {
            match self.csrf.delete_csrf_for(token, user_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                // Someone else's token stays put
                Err(AuthError::CsrfRejected) => {}
                Err(e) => tracing::warn!(error = %e, "CSRF token not deleted on sign out"),
            }
        }

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }
}
