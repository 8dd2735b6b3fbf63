//! Identity lookup capability consumed by the employee context.

use async_trait::async_trait;

use super::IdentityClaims;

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// `None` means the caller is anonymous.
    async fn current_subject_id(&self) -> Option<String>;
    async fn current_display_name(&self) -> Option<String>;
    async fn current_email(&self) -> Option<String>;
}

/// Identity backed by a validated bearer token.
#[derive(Debug, Clone)]
pub struct ClaimsIdentity {
    claims: IdentityClaims,
}

impl ClaimsIdentity {
    pub fn new(claims: IdentityClaims) -> Self {
        Self { claims }
    }
}

#[async_trait]
impl IdentityLookup for ClaimsIdentity {
    async fn current_subject_id(&self) -> Option<String> {
        Some(self.claims.subject_id().to_string()).filter(|s| !s.is_empty())
    }

    async fn current_display_name(&self) -> Option<String> {
        self.claims.name.clone()
    }

    async fn current_email(&self) -> Option<String> {
        self.claims.email().map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityLookup for AnonymousIdentity {
    async fn current_subject_id(&self) -> Option<String> {
        None
    }

    async fn current_display_name(&self) -> Option<String> {
        None
    }

    async fn current_email(&self) -> Option<String> {
        None
    }
}
