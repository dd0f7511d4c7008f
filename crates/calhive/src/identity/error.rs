use thiserror::Error;

use calhive_core::storage::RepositoryError;

/// Why a request could not be tied to a user.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Missing {0} header")]
    MissingHeader(&'static str),
    #[error("Invalid {0} header, expected 'Bearer <token>'")]
    MalformedHeader(&'static str),
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("User directory error: {0}")]
    Directory(#[from] RepositoryError),
}

impl IdentityError {
    /// True when the caller failed to authenticate, as opposed to the
    /// directory failing behind a valid token.
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, IdentityError::Directory(_))
    }
}
