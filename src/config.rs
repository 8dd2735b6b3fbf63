use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub oidc_issuer: String,
    pub oidc_audience: String,
    pub oidc_jwks_url: String,
    pub bind_addr: String,
    pub cors_origin: String,
    pub session_cache_ttl_secs: u64,
    pub database_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let required = |key: &str| lookup(key).ok_or_else(|| format!("{} must be set", key));

        let database_url = required("DATABASE_URL")?;
        let oidc_issuer = required("OIDC_ISSUER")?
            .trim_end_matches('/')
            .to_string();
        let oidc_audience = required("OIDC_AUDIENCE")?;

        let oidc_jwks_url = lookup("OIDC_JWKS_URL")
            .unwrap_or_else(|| format!("{}/discovery/v2.0/keys", oidc_issuer));
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let number = |key: &str, default: u64| -> Result<u64, String> {
            match lookup(key) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| format!("{} must be a non-negative number, got {}", key, raw)),
                None => Ok(default),
            }
        };
        let session_cache_ttl_secs = number("SESSION_CACHE_TTL_SECS", 300)?;
        let database_max_connections = u32::try_from(number("DATABASE_MAX_CONNECTIONS", 10)?)
            .map_err(|_| "DATABASE_MAX_CONNECTIONS is too large".to_string())?;

        Ok(Self {
            database_url,
            oidc_issuer,
            oidc_audience,
            oidc_jwks_url,
            bind_addr,
            cors_origin,
            session_cache_ttl_secs,
            database_max_connections,
        })
    }
}
