use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::{
    auth::{self, ClaimsIdentity, IdentityClaims, IdentityLookup, Roles},
    context::EmployeeContext,
    models::Employee,
    AppError, AppResult, AppState,
};

/// Token from the `Authorization: Bearer` header, falling back to the `__session` cookie.
async fn extract_token_from_request(parts: &mut Parts) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, &()).await
    {
        return Some(bearer.token().to_string());
    }

    let cookie_header = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix("__session="))
        .map(str::to_string)
}

/// The resolved employee of an authenticated request, plus the session context that produced it.
#[derive(Clone)]
pub struct CurrentEmployee {
    pub employee: Employee,
    pub roles: Roles,
    pub context: Arc<EmployeeContext>,
}

impl FromRequestParts<Arc<AppState>> for CurrentEmployee {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_request(parts).await.ok_or_else(|| {
            AppError::Unauthorized("Missing authentication: no bearer token or __session cookie".to_string())
        })?;

        let claims = auth::validate_jwt(
            &token,
            &state.jwks_cache,
            &state.config.oidc_issuer,
            &state.config.oidc_audience,
        )
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized(e.to_string())
        })?;

        CurrentEmployee::from_claims(state, claims).await
    }
}

impl CurrentEmployee {
    /// Roles always come from this request's token; the cached session context only carries
    /// the employee record.
    pub(crate) async fn from_claims(state: &AppState, claims: IdentityClaims) -> AppResult<Self> {
        let roles = claims.roles();
        let identity: Arc<dyn IdentityLookup> = Arc::new(ClaimsIdentity::new(claims));
        let context = state.contexts.context_for(identity).await;
        let employee = context.require_current().await?;

        tracing::debug!(employee_id = %employee.employee_id, ?roles, "Request authenticated");
        Ok(CurrentEmployee {
            employee,
            roles,
            context,
        })
    }
}
