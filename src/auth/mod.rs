//! # Authentication
//!
//! Everything needed to end up with a bearer token the Suno API accepts.
//!
//! ```text
//! NoToken -> CheckingCache -> Valid
//!                 |
//!                 v
//!             Acquiring -> Valid
//!                 |
//!                 v
//!               Failed
//! ```
//!
//! - [`TokenValidator`] runs the shape, expiry and liveness checks.
//! - [`Acquirer`] walks a list of [`TokenAcquisitionBackend`]s: a WebDriver
//!   controlled browser first, then a pasted token.
//! - [`AuthOrchestrator`] ties those to the [`TokenStore`].
//!
//! A freshly acquired token is saved and returned as is. It gets validated
//! the next time it is loaded from the cache.

mod acquire;
mod validator;
mod webdriver;

use std::fmt;

pub use acquire::{
    AcquireError, Acquirer, BrowserBackend, ManualBackend, PollPolicy, TOKEN_STORAGE_KEY,
    TokenAcquisitionBackend,
};
pub use validator::{LivenessProbe, Rejection, TokenValidator, check_offline};
pub use webdriver::WebDriverSession;

use crate::{
    management::{StoreError, TokenStore},
    success,
    types::Credential,
    warning,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoToken,
    CheckingCache,
    Valid,
    Acquiring,
    Failed,
}

#[derive(Debug)]
pub enum AuthError {
    /// No cached token worked and every acquisition backend came back empty.
    Exhausted,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Exhausted => write!(f, "Failed to authenticate with Suno"),
        }
    }
}

impl std::error::Error for AuthError {}

pub struct AuthOrchestrator<P> {
    store: TokenStore,
    validator: TokenValidator<P>,
    acquirer: Acquirer,
    state: AuthState,
}

impl<P: LivenessProbe> AuthOrchestrator<P> {
    pub fn new(store: TokenStore, validator: TokenValidator<P>, acquirer: Acquirer) -> Self {
        AuthOrchestrator {
            store,
            validator,
            acquirer,
            state: AuthState::NoToken,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub async fn get_usable_credential(&mut self) -> Result<Credential, AuthError> {
        self.state = AuthState::CheckingCache;
        if let Some(cached) = self.store.load().await {
            if self.validator.is_valid(&cached).await {
                success!("Using cached token");
                self.state = AuthState::Valid;
                return Ok(cached);
            }
        }

        self.state = AuthState::Acquiring;
        match self.acquirer.acquire().await {
            Some(credential) => {
                match self.store.save(&credential).await {
                    Ok(()) => success!("Token saved to {}", self.store.path().display()),
                    Err(e) => warning!("Could not save token: {}", e),
                }
                self.state = AuthState::Valid;
                Ok(credential)
            }
            None => {
                self.state = AuthState::Failed;
                Err(AuthError::Exhausted)
            }
        }
    }

    /// Forgets the cached token. Does not sign in again.
    pub async fn logout(&mut self) -> Result<(), StoreError> {
        self.store.clear().await?;
        self.state = AuthState::NoToken;
        Ok(())
    }
}
