#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("record store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}
