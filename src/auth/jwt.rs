use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::{
    claims::IdentityClaims,
    jwks::{JwksCache, KeyError},
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),

    #[error("token header carries no key id")]
    MissingKid,

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("token rejected: {0}")]
    Rejected(jsonwebtoken::errors::Error),
}

/// Verifies an RS256 token against the provider's keys, issuer and audience.
pub async fn validate_jwt(
    token: &str,
    jwks_cache: &JwksCache,
    expected_issuer: &str,
    expected_audience: &str,
) -> Result<IdentityClaims, TokenError> {
    let header = decode_header(token).map_err(TokenError::Malformed)?;
    let kid = header.kid.ok_or(TokenError::MissingKid)?;
    let decoding_key = jwks_cache.decoding_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[expected_issuer]);
    validation.set_audience(&[expected_audience]);
    validation.leeway = 30;

    decode::<IdentityClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(TokenError::Rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_token_is_rejected_before_any_key_fetch() {
        let cache = JwksCache::new("http://127.0.0.1:9/keys");
        let result = validate_jwt("not-a-jwt", &cache, "issuer", "audience").await;

        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }
}
