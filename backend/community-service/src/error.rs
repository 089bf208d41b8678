/// Error types for community-service
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the query gateway.
///
/// Constraint violations are distinguished from plain unavailability so the
/// engines can decide which ones are success-equivalent (duplicate reaction
/// inserts) and which are terminal (dangling references).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unsupported query shape: {0}")]
    Unsupported(String),
}

/// Result type alias for gateway operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the feed and reaction engines.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Any gateway failure. Recoverable by retry; the read path degrades to
    /// defaults where the contract says so instead of raising this.
    #[error("query failed: {0}")]
    Transient(#[source] StoreError),

    /// A gated action was attempted without membership. Terminal for the
    /// call; no mutation was performed.
    #[error("user {user_id} is not a member of community {community_id}")]
    NotAMember { user_id: Uuid, community_id: Uuid },

    /// Neither an authenticated principal nor an anonymous identity could be
    /// resolved. Surfaced distinctly so the caller can prompt sign-in.
    #[error("no authenticated or anonymous identity available")]
    Unauthenticated,

    /// A referenced row (post, user) no longer exists.
    #[error("referenced row no longer exists: {0}")]
    InvalidReference(String),

    /// A toggle for the same (post, kind) is still in flight on this client.
    #[error("a reaction toggle for this post is already in flight")]
    ToggleInFlight,
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ForeignKeyViolation(detail) => EngineError::InvalidReference(detail),
            // Unique violations are intercepted at the call sites where they
            // are success-equivalent; any that reach this conversion are
            // ordinary failures.
            other => EngineError::Transient(other),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
