//! Sign In Use Case
//!
//! Checks login and password, then issues a session and a CSRF token.

use std::sync::Arc;

use platform::password::{ClearTextPassword, verify_against_dummy};

use crate::application::auth_service::{AuthService, SessionToken};
use crate::application::csrf_service::{CsrfData, CsrfService};
use crate::domain::entity::user::User;
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::domain::value_object::login::Login;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub login: String,
    pub password: String,
}

/// Credentials handed to a freshly authenticated client
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub user: User,
    pub session: SessionToken,
    pub csrf: CsrfData,
}

/// Sign in use case
pub struct SignInUseCase<U, S> {
    users: Arc<U>,
    auth: AuthService<S>,
    csrf: CsrfService<S>,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository + Send + Sync,
    S: SessionRepository + CsrfRepository + Send + Sync,
{
    pub fn new(users: Arc<U>, auth: AuthService<S>, csrf: CsrfService<S>) -> Self {
        Self { users, auth, csrf }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<IssuedCredentials> {
        let password = ClearTextPassword::for_verification(input.password);

        // A malformed login cannot exist, so it is treated like an unknown one
        let credentials = match Login::parse(&input.login) {
            Ok(login) => self.users.find_by_login(&login).await?,
            Err(_) => None,
        };

        // Unknown logins cost one Argon2 verify too
        let Some(credentials) = credentials else {
            verify_against_dummy(&password);
            tracing::info!("Sign in rejected: unknown login");
            return Err(AuthError::InvalidCredentials);
        };

        if !credentials.password_hash.verify(&password) {
            tracing::info!(login = %credentials.user.login, "Sign in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = issue_credentials(&self.auth, &self.csrf, credentials.user).await?;

        tracing::info!(
            user_id = %issued.user.user_id,
            expires_at = %issued.session.expires_at,
            "User signed in"
        );

        Ok(issued)
    }
}

/// Start a session and a CSRF token for `user`.
///
/// If the CSRF token cannot be stored the new session is revoked again, so
/// the client never holds half a credential pair.
pub(crate) async fn issue_credentials<S>(
    auth: &AuthService<S>,
    csrf: &CsrfService<S>,
    user: User,
) -> AuthResult<IssuedCredentials>
where
    S: SessionRepository + CsrfRepository + Send + Sync,
{
    let session = auth.auth_user(user.user_id).await?;

    let csrf = match csrf.setup_csrf(user.user_id).await {
        Ok(csrf) => csrf,
        Err(e) => {
            if let Err(revoke) = auth.log_out(&session.id).await {
                tracing::warn!(error = %revoke, "Could not revoke session after CSRF failure");
            }
            return Err(e);
        }
    };

    Ok(IssuedCredentials {
        user,
        session,
        csrf,
    })
}
