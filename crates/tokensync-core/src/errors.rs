use thiserror::Error;
use tokensync_core_types::RequestId;

/// Result type alias using TokenSyncError
pub type Result<T> = std::result::Result<T, TokenSyncError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    InvalidSnapshotFormat,
    InvalidVersion,
    InvalidChunkSize,

    // Persistence path
    /// Reassembled chunk payload does not parse
    CorruptPayload,

    // Acceptance
    PolicyDenied,

    // Configuration
    Config,

    // Pipeline
    DeterminismViolation,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidSnapshotFormat => "ERR_INVALID_SNAPSHOT_FORMAT",
            ExErrorKind::InvalidVersion => "ERR_INVALID_VERSION",
            ExErrorKind::InvalidChunkSize => "ERR_INVALID_CHUNK_SIZE",
            ExErrorKind::CorruptPayload => "ERR_CORRUPT_PAYLOAD",
            ExErrorKind::PolicyDenied => "ERR_POLICY_DENIED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::DeterminismViolation => "ERR_DETERMINISM_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling plus
/// context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    token_path: Option<String>,
    entry_key: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            token_path: None,
            entry_key: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add token path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Add snapshot entry key context
    pub fn with_entry_key(mut self, key: impl Into<String>) -> Self {
        self.entry_key = Some(key.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the token path context, if any
    pub fn token_path(&self) -> Option<&str> {
        self.token_path.as_deref()
    }

    /// Get the entry key context, if any
    pub fn entry_key(&self) -> Option<&str> {
        self.entry_key.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.token_path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(key) = &self.entry_key {
            write!(f, " (entry: {})", key)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for snapshot reconciliation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenSyncError {
    /// Snapshot document lacks its required structure
    #[error("Invalid snapshot format: {reason}")]
    InvalidSnapshotFormat { reason: String },

    /// Reassembled chunk payload could not be deserialized
    #[error("Corrupt payload across {chunk_count} chunk(s): {reason}")]
    CorruptPayload { chunk_count: usize, reason: String },

    /// Chunk size must be at least one character
    #[error("Invalid chunk size: {size}")]
    InvalidChunkSize { size: usize },

    /// Version string is not `major.minor.patch`
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Acceptance policy rejected a snapshot
    #[error("Snapshot rejected by {policy} policy: {reason}")]
    PolicyDenied { policy: String, reason: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Filesystem failure at the caller boundary
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Matching produced an inconsistent result
    #[error("Determinism violation: {message}")]
    DeterminismViolation { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for TokenSyncError {
    fn from(err: serde_json::Error) -> Self {
        TokenSyncError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for TokenSyncError {
    fn from(err: std::io::Error) -> Self {
        TokenSyncError::Io {
            message: err.to_string(),
        }
    }
}

/// Conversion from TokenSyncError to ExError
impl From<TokenSyncError> for ExError {
    fn from(err: TokenSyncError) -> Self {
        let message = err.to_string();
        let kind = match &err {
            TokenSyncError::InvalidSnapshotFormat { .. } => ExErrorKind::InvalidSnapshotFormat,
            TokenSyncError::CorruptPayload { .. } => ExErrorKind::CorruptPayload,
            TokenSyncError::InvalidChunkSize { .. } => ExErrorKind::InvalidChunkSize,
            TokenSyncError::InvalidVersion { .. } => ExErrorKind::InvalidVersion,
            TokenSyncError::PolicyDenied { .. } => ExErrorKind::PolicyDenied,
            TokenSyncError::Config { .. } => ExErrorKind::Config,
            TokenSyncError::Io { .. } => ExErrorKind::Io,
            TokenSyncError::Serialization { .. } => ExErrorKind::Serialization,
            TokenSyncError::DeterminismViolation { .. } => ExErrorKind::DeterminismViolation,
            TokenSyncError::Internal { .. } => ExErrorKind::Internal,
        };
        ExError::new(kind).with_message(message)
    }
}

impl TokenSyncError {
    /// Stable error code of the canonical kind this error maps to
    pub fn code(&self) -> &'static str {
        ExError::from(self.clone()).code()
    }
}
