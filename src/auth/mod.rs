pub mod claims;
pub mod identity;
pub mod jwks;
pub mod jwt;

pub use claims::{IdentityClaims, Roles};
pub use identity::{AnonymousIdentity, ClaimsIdentity, IdentityLookup};
pub use jwks::{JwksCache, KeyError};
pub use jwt::{validate_jwt, TokenError};
