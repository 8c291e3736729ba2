use thiserror::Error;

/// Core error type for Strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// A referenced collection or field id is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Id or name collision on create.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The edit would break referential integrity or an ordering constraint.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Failure inside an `up`/`down` body.
    #[error("Migration '{migration}' failed")]
    Transformation {
        migration: String,
        #[source]
        source: Box<StrataError>,
    },

    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StrataError {
    /// Wrap an error raised while running a migration body.
    pub fn transformation(migration: impl Into<String>, source: StrataError) -> Self {
        StrataError::Transformation {
            migration: migration.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `Transformation` wrappers.
    pub fn root_cause(&self) -> &StrataError {
        match self {
            StrataError::Transformation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}

/// Result type alias using StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;
