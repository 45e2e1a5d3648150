use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or attribute key that caused the error (e.g., "records[3].Title", "target_dims")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected length, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "embeddings", "pca", "dataset_vs_words")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for the analysis engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {message}{}", format_context(.context))]
    InvalidArgument {
        message: String,
        context: ErrorContext,
    },

    #[error("Zero magnitude: {message}{}", format_context(.context))]
    ZeroMagnitude {
        message: String,
        context: ErrorContext,
    },

    #[error("Not found: {message}{}", format_context(.context))]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    #[error("Computation failed: {message}{}", format_context(.context))]
    Computation {
        message: String,
        context: ErrorContext,
        #[source]
        cause: Option<BoxedCause>,
    },

    #[error("External service error: {message}{}", format_context(.context))]
    ExternalService {
        message: String,
        context: ErrorContext,
        #[source]
        cause: Option<BoxedCause>,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::invalid_argument_with_context(msg, ErrorContext::new())
    }

    pub fn invalid_argument_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidArgument {
            message: msg.into(),
            context,
        }
    }

    pub fn zero_magnitude(msg: impl Into<String>) -> Self {
        Error::ZeroMagnitude {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::not_found_with_context(msg, ErrorContext::new())
    }

    pub fn not_found_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::NotFound {
            message: msg.into(),
            context,
        }
    }

    /// Wrap a failure raised inside a numeric transform, keeping the original cause.
    pub fn computation<E>(msg: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxedCause>,
    {
        Error::Computation {
            message: msg.into(),
            context: ErrorContext::new(),
            cause: Some(cause.into()),
        }
    }

    pub fn external_service_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::ExternalService {
            message: msg.into(),
            context,
            cause: None,
        }
    }

    /// Wrap a collaborator failure (provider, vector store, generator, plotter) with its cause.
    pub fn external_service<E>(msg: impl Into<String>, context: ErrorContext, cause: E) -> Self
    where
        E: Into<BoxedCause>,
    {
        Error::ExternalService {
            message: msg.into(),
            context,
            cause: Some(cause.into()),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Error::Cancelled(msg.into())
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidArgument { context, .. }
            | Error::ZeroMagnitude { context, .. }
            | Error::NotFound { context, .. }
            | Error::Computation { context, .. }
            | Error::ExternalService { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    pub fn is_zero_magnitude(&self) -> bool {
        matches!(self, Error::ZeroMagnitude { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_computation(&self) -> bool {
        matches!(self, Error::Computation { .. })
    }

    pub fn is_external_service(&self) -> bool {
        matches!(self, Error::ExternalService { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}
