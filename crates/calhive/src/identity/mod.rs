//! Bearer-token identity.
//!
//! Requests carry an access token in `Authorization` and an ID token in
//! `X-Id-Token`, both as `Bearer <jwt>`. The ID token's subject is the
//! caller; unknown subjects are registered on first sight.

mod claims;
mod error;
mod extractor;
mod resolver;
mod verifier;

pub use claims::TokenClaims;
pub use error::IdentityError;
pub use extractor::CurrentUser;
pub use resolver::IdentityResolver;
pub use verifier::TokenVerifier;
