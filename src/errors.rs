use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;
use uuid::Uuid;

use crate::media::MediaError;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A unique constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A row referenced by a foreign key does not exist, or still has dependents.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Media error: {0}")]
    MediaError(
        #[serde(skip)]
        MediaError,
    ),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                ServiceError::ForeignKeyViolation(msg)
            }
            _ => match err {
                DbErr::RecordNotFound(msg) => ServiceError::NotFound(msg),
                other => ServiceError::DatabaseError(other),
            },
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<MediaError> for ServiceError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidPath(msg) => ServiceError::ValidationError(msg),
            other => ServiceError::MediaError(other),
        }
    }
}

impl ServiceError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        ServiceError::NotFound(format!("{} with ID {} not found", entity, id))
    }

    pub fn not_found_by_slug(entity: &str, slug: &str) -> Self {
        ServiceError::NotFound(format!("{} with slug '{}' not found", entity, slug))
    }

    /// A write referenced a parent row that does not exist.
    pub fn missing_reference(entity: &str, id: Uuid) -> Self {
        ServiceError::ForeignKeyViolation(format!("{} with ID {} does not exist", entity, id))
    }

    /// True when the error came from a unique constraint.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: ServiceError = DbErr::RecordNotFound("product 42".into()).into();
        assert_matches!(err, ServiceError::NotFound(msg) if msg == "product 42");
    }

    #[test]
    fn custom_db_errors_stay_database_errors() {
        let err: ServiceError = DbErr::Custom("boom".into()).into();
        assert_matches!(err, ServiceError::DatabaseError(DbErr::Custom(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn invalid_media_path_is_a_validation_error() {
        let err: ServiceError = MediaError::InvalidPath("../etc/passwd".into()).into();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[test]
    fn not_found_message_names_entity() {
        let id = Uuid::nil();
        assert_eq!(
            ServiceError::not_found("Brand", id).to_string(),
            format!("Not found: Brand with ID {} not found", id)
        );
        assert_matches!(
            ServiceError::missing_reference("Variant type", id),
            ServiceError::ForeignKeyViolation(msg) if msg.contains("Variant type")
        );
        assert_eq!(
            ServiceError::not_found_by_slug("Category", "shoes").to_string(),
            "Not found: Category with slug 'shoes' not found"
        );
    }
}
