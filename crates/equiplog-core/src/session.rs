//! Explicit session context: who is signed in and how to sign them out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::AuthError;

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn logout(&self) -> Result<(), AuthError>;

    fn is_signed_in(&self) -> bool;
}

/// Single-operator authenticator for local deployments.
#[derive(Debug)]
pub struct LocalAuthenticator {
    signed_in: AtomicBool,
}

impl Default for LocalAuthenticator {
    fn default() -> Self {
        Self {
            signed_in: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn logout(&self) -> Result<(), AuthError> {
        if self.signed_in.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::NotSignedIn)
        }
    }

    fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct Session {
    display_name: String,
    authenticator: Arc<dyn Authenticator>,
}

impl Session {
    pub fn new(display_name: impl Into<String>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            display_name: display_name.into(),
            authenticator,
        }
    }

    /// A signed-in session backed by [`LocalAuthenticator`].
    pub fn local(display_name: impl Into<String>) -> Self {
        Self::new(display_name, Arc::new(LocalAuthenticator::default()))
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_signed_in(&self) -> bool {
        self.authenticator.is_signed_in()
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.authenticator.logout().await?;
        info!(user = %self.display_name, "signed out");
        Ok(())
    }
}
