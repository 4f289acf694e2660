use std::fmt;

use envstash_core_types::RequestId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExError>;

/// Classification of every failure the service can report
///
/// Each kind has a stable `ERR_*` code that scripts and log queries can
/// match on. Callers usually only need to tell "absent" (the three
/// not-found kinds) from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    EnvironmentNotFound,
    VariableNotFound,
    ReferenceNotFound,

    /// A unique key (environment name, or name within an environment) is taken
    AlreadyExists,
    /// A variable cannot be deleted while a reference targets it
    ReferencedByOther,

    InvalidInput,

    /// Begin, commit or rollback failed
    TransactionFailure,
    /// `with_tx` was called on a service already bound to a transaction
    NestedTransaction,

    /// The request deadline passed
    Timeout,
    Persistence,
    Serialization,
    Io,

    Internal,
}

impl ExErrorKind {
    pub fn code(&self) -> &'static str {
        use ExErrorKind::*;
        match self {
            EnvironmentNotFound => "ERR_ENVIRONMENT_NOT_FOUND",
            VariableNotFound => "ERR_VARIABLE_NOT_FOUND",
            ReferenceNotFound => "ERR_REFERENCE_NOT_FOUND",
            AlreadyExists => "ERR_ALREADY_EXISTS",
            ReferencedByOther => "ERR_REFERENCED_BY_OTHER",
            InvalidInput => "ERR_INVALID_INPUT",
            TransactionFailure => "ERR_TRANSACTION_FAILURE",
            NestedTransaction => "ERR_NESTED_TRANSACTION",
            Timeout => "ERR_TIMEOUT",
            Persistence => "ERR_PERSISTENCE",
            Serialization => "ERR_SERIALIZATION",
            Io => "ERR_IO",
            Internal => "ERR_INTERNAL",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExErrorKind::EnvironmentNotFound
                | ExErrorKind::VariableNotFound
                | ExErrorKind::ReferenceNotFound
        )
    }
}

/// The error every service operation returns
///
/// Built from a kind and then enriched as it travels up: the repository
/// adds the entity key (`env` or `env/name`), the service adds the
/// operation name and request id. Variable values never appear in any
/// field.
///
/// ```
/// use envstash_core::{ExError, ExErrorKind};
///
/// let err = ExError::new(ExErrorKind::VariableNotFound)
///     .with_op("var_show")
///     .with_entity_id("dev/PORT");
/// assert_eq!(err.to_string(), "[ERR_VARIABLE_NOT_FOUND] in operation 'var_show' (entity_id: dev/PORT)");
/// ```
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    pub fn with_op(self, op: impl Into<String>) -> Self {
        Self {
            op: Some(op.into()),
            ..self
        }
    }

    /// Entity key: `env` for environments, `env/name` for variables and references
    pub fn with_entity_id(self, entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            ..self
        }
    }

    pub fn with_request_id(self, request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
            ..self
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    /// Chain the failure that caused this one
    pub fn with_source(self, cause: ExError) -> Self {
        Self {
            source: Some(Box::new(cause)),
            ..self
        }
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

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind.is_not_found()
    }
}

/// `[CODE] in operation 'op': message (entity_id: key): caused by: ...`,
/// leaving out whatever is unset
impl fmt::Display for ExError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = self.op() {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = self.entity_id() {
            write!(f, " (entity_id: {})", key)?;
        }
        match self.source_error() {
            Some(cause) => write!(f, ": caused by: {}", cause),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = self.source.as_deref()?;
        Some(cause)
    }
}

/// Domain failures raised by the service layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvStashError {
    #[error("Environment not found: {name}")]
    EnvironmentNotFound { name: String },

    #[error("Variable not found: {env_name}/{name}")]
    VariableNotFound { env_name: String, name: String },

    #[error("Reference not found: {env_name}/{name}")]
    ReferenceNotFound { env_name: String, name: String },

    #[error("Environment already exists: {name}")]
    EnvironmentAlreadyExists { name: String },

    #[error("Variable already exists: {env_name}/{name}")]
    VariableAlreadyExists { env_name: String, name: String },

    #[error("Reference already exists: {env_name}/{name}")]
    ReferenceAlreadyExists { env_name: String, name: String },

    /// Variable is the target of at least one reference
    #[error("Variable {env_name}/{name} is referenced by: {referenced_by:?}")]
    VariableReferenced {
        env_name: String,
        name: String,
        referenced_by: Vec<String>,
    },

    /// Environment owns a variable targeted by a reference elsewhere
    #[error("Environment {name} has variables referenced by: {referenced_by:?}")]
    EnvironmentReferenced {
        name: String,
        referenced_by: Vec<String>,
    },

    /// Only one half of a reference target was supplied
    #[error("both ref_env and ref_var must be provided together")]
    IncompleteRefTarget,

    /// A patch tried to clear a field that has no default
    #[error("Field {field} cannot be cleared")]
    FieldNotClearable { field: String },

    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<EnvStashError> for ExError {
    fn from(err: EnvStashError) -> Self {
        let message = err.to_string();
        match err {
            EnvStashError::EnvironmentNotFound { name } => {
                ExError::new(ExErrorKind::EnvironmentNotFound)
                    .with_entity_id(name)
                    .with_message(message)
            }
            EnvStashError::VariableNotFound { env_name, name } => {
                ExError::new(ExErrorKind::VariableNotFound)
                    .with_entity_id(format!("{}/{}", env_name, name))
                    .with_message(message)
            }
            EnvStashError::ReferenceNotFound { env_name, name } => {
                ExError::new(ExErrorKind::ReferenceNotFound)
                    .with_entity_id(format!("{}/{}", env_name, name))
                    .with_message(message)
            }
            EnvStashError::EnvironmentAlreadyExists { name } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_entity_id(name)
                    .with_message(message)
            }
            EnvStashError::VariableAlreadyExists { env_name, name }
            | EnvStashError::ReferenceAlreadyExists { env_name, name } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_entity_id(format!("{}/{}", env_name, name))
                    .with_message(message)
            }
            EnvStashError::VariableReferenced { env_name, name, .. } => {
                ExError::new(ExErrorKind::ReferencedByOther)
                    .with_entity_id(format!("{}/{}", env_name, name))
                    .with_message(message)
            }
            EnvStashError::EnvironmentReferenced { name, .. } => {
                ExError::new(ExErrorKind::ReferencedByOther)
                    .with_entity_id(name)
                    .with_message(message)
            }
            EnvStashError::IncompleteRefTarget
            | EnvStashError::FieldNotClearable { .. }
            | EnvStashError::InvalidName { .. }
            | EnvStashError::InvalidTimestamp { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            EnvStashError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for EnvStashError {
    fn from(err: serde_json::Error) -> Self {
        EnvStashError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        EnvStashError::from(err).into()
    }
}
