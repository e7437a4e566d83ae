use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// A prerequisite pipeline stage has not run yet. The message names the
    /// stage to run.
    #[error("precondition not met: {0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
