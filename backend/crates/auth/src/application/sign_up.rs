//! Sign Up Use Case
//!
//! Registers a user and signs them in straight away.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::auth_service::AuthService;
use crate::application::csrf_service::CsrfService;
use crate::application::sign_in::{IssuedCredentials, issue_credentials};
use crate::domain::entity::user::NewUser;
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::domain::value_object::login::Login;
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub login: String,
    pub password: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Sign up use case
pub struct SignUpUseCase<U, S> {
    users: Arc<U>,
    auth: AuthService<S>,
    csrf: CsrfService<S>,
}

impl<U, S> SignUpUseCase<U, S>
where
    U: UserRepository + Send + Sync,
    S: SessionRepository + CsrfRepository + Send + Sync,
{
    pub fn new(users: Arc<U>, auth: AuthService<S>, csrf: CsrfService<S>) -> Self {
        Self { users, auth, csrf }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<IssuedCredentials> {
        let login = Login::parse(&input.login).map_err(AuthError::InvalidLogin)?;

        let password = ClearTextPassword::new(input.password)?;
        let password_hash = password.hash()?;

        let new_user = NewUser {
            login,
            name: non_empty(input.name),
            email: non_empty(input.email),
            password_hash,
        };

        // Uniqueness is enforced by the store, which reports LoginTaken
        let user = self.users.create_user(&new_user).await?;

        tracing::info!(user_id = %user.user_id, login = %user.login, "User signed up");

        issue_credentials(&self.auth, &self.csrf, user).await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
