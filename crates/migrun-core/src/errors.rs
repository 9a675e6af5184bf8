use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure the migration engine can surface maps to exactly one kind.
/// Each kind carries a stable code used by tests and by operators grepping logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Before any migration runs
    /// Connection parameters could not be determined
    Configuration,
    /// Database handle could not be opened or pinged
    Connection,
    /// Migrations directory missing or unlistable
    Discovery,

    // Version record
    /// Version table create/read/write failure
    Storage,

    // Mid-batch
    /// A specific migration script could not be read
    FileRead,
    /// A specific migration script was rejected by the database
    Execution,

    // General
    InvalidInput,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Connection => "ERR_CONNECTION",
            ExErrorKind::Discovery => "ERR_DISCOVERY",
            ExErrorKind::Storage => "ERR_STORAGE",
            ExErrorKind::FileRead => "ERR_FILE_READ",
            ExErrorKind::Execution => "ERR_EXECUTION",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the context an operator needs to act on a
/// failed run: the operation, the migration file and its ordinal.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    migration: Option<String>,
    ordinal: Option<i64>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            migration: None,
            ordinal: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add migration file name context
    pub fn with_migration(mut self, name: impl Into<String>) -> Self {
        self.migration = Some(name.into());
        self
    }

    /// Add ordinal context
    pub fn with_ordinal(mut self, ordinal: i64) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn migration(&self) -> Option<&str> {
        self.migration.as_deref()
    }

    pub fn ordinal(&self) -> Option<i64> {
        self.ordinal
    }

    pub fn message(&self) -> &str {
        &self.message
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
        if let Some(migration) = &self.migration {
            write!(f, " (migration: {})", migration)?;
        }
        if let Some(ordinal) = self.ordinal {
            write!(f, " (ordinal: {})", ordinal)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for migration runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrateError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Cannot connect to {target}: {reason}")]
    Connection { target: String, reason: String },

    #[error("Version store {op} failed: {reason}")]
    Storage { op: String, reason: String },

    #[error("Cannot list migrations directory {dir}: {reason}")]
    Discovery { dir: String, reason: String },

    #[error("Cannot read migration: {reason}")]
    FileRead { migration: String, reason: String },

    #[error("Migration failed: {reason}")]
    Execution {
        migration: String,
        ordinal: i64,
        reason: String,
    },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl From<MigrateError> for ExError {
    fn from(err: MigrateError) -> Self {
        let message = err.to_string();
        match err {
            MigrateError::Configuration { .. } => ExError::new(ExErrorKind::Configuration)
                .with_op("load_config")
                .with_message(message),

            MigrateError::Connection { .. } => ExError::new(ExErrorKind::Connection)
                .with_op("connect")
                .with_message(message),

            MigrateError::Storage { op, .. } => ExError::new(ExErrorKind::Storage)
                .with_op(op)
                .with_message(message),

            MigrateError::Discovery { .. } => ExError::new(ExErrorKind::Discovery)
                .with_op("list_migrations")
                .with_message(message),

            MigrateError::FileRead { migration, .. } => ExError::new(ExErrorKind::FileRead)
                .with_op("read_migration")
                .with_migration(migration)
                .with_message(message),

            MigrateError::Execution {
                migration, ordinal, ..
            } => ExError::new(ExErrorKind::Execution)
                .with_op("apply_migration")
                .with_migration(migration)
                .with_ordinal(ordinal)
                .with_message(message),

            MigrateError::InvalidInput { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
        }
    }
}
