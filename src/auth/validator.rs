use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{types::Credential, types::MIN_TOKEN_LENGTH, warning};

/// Asks the remote service whether it still accepts a credential.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_accepted(&self, credential: &Credential) -> bool;
}

/// Why a credential was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    Undecodable(String),
    Expired(DateTime<Utc>),
    Refused,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed => write!(f, "token is shorter than {} characters", MIN_TOKEN_LENGTH),
            Rejection::Undecodable(e) => write!(f, "token cannot be decoded: {}", e),
            Rejection::Expired(at) => write!(f, "token expired at {}", at.to_rfc3339()),
            Rejection::Refused => write!(f, "token was rejected by the API"),
        }
    }
}

/// Three checks in order, stopping at the first failure: shape, embedded
/// expiry, then a round trip to the service. Only the last one uses the network.
pub struct TokenValidator<P> {
    probe: P,
}

impl<P: LivenessProbe> TokenValidator<P> {
    pub fn new(probe: P) -> Self {
        TokenValidator { probe }
    }

    pub async fn is_valid(&self, credential: &Credential) -> bool {
        match self.check(credential, Utc::now()).await {
            Ok(()) => true,
            Err(reason) => {
                warning!("Cached token unusable: {}", reason);
                false
            }
        }
    }

    pub async fn check(&self, credential: &Credential, now: DateTime<Utc>) -> Result<(), Rejection> {
        check_offline(credential, now)?;

        if !self.probe.is_accepted(credential).await {
            return Err(Rejection::Refused);
        }
        Ok(())
    }
}

/// Shape and expiry checks, no network.
pub fn check_offline(credential: &Credential, now: DateTime<Utc>) -> Result<(), Rejection> {
    if !credential.is_well_formed() {
        return Err(Rejection::Malformed);
    }

    match credential.expires_at() {
        Err(e) => Err(Rejection::Undecodable(e)),
        Ok(Some(exp)) if exp < now => Err(Rejection::Expired(exp)),
        Ok(_) => Ok(()),
    }
}
