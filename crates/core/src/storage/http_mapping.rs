//! Pure functions for mapping repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404
/// - `AlreadyExists` -> 409
/// - `ConnectionFailed` -> 503
/// - `QueryFailed`, `Serialization` -> 500
/// - `InvalidData` -> 400
/// - `Cancelled` -> 499 (client closed request)
/// - `DeadlineExceeded` -> 504
///
/// # Examples
///
/// ```
/// use calhive_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Calendar",
///     id: "abc-123".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) => 500,
        RepositoryError::Serialization(_) => 500,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::Cancelled => 499,
        RepositoryError::DeadlineExceeded => 504,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let error = RepositoryError::NotFound {
            entity_type: "Event",
            id: "evt-123".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 404);
    }

    #[test]
    fn test_already_exists_maps_to_409() {
        let error = RepositoryError::item_exists("USER#u1", "PROFILE");
        assert_eq!(repository_error_to_status_code(&error), 409);
    }

    #[test]
    fn test_connection_failed_maps_to_503() {
        let error = RepositoryError::ConnectionFailed("dispatch failure".to_string());
        assert_eq!(repository_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_storage_failures_map_to_500() {
        let query = RepositoryError::QueryFailed("throttled".to_string());
        let serialization = RepositoryError::Serialization("bad attribute".to_string());
        assert_eq!(repository_error_to_status_code(&query), 500);
        assert_eq!(repository_error_to_status_code(&serialization), 500);
    }

    #[test]
    fn test_cancellation_codes() {
        assert_eq!(repository_error_to_status_code(&RepositoryError::Cancelled), 499);
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::DeadlineExceeded),
            504
        );
    }
}
