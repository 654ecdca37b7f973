//! Platy Error Types with Error Codes
//!
//! Error code ranges:
//! - PLATY-001-009: Stack file errors
//! - PLATY-020-029: Graph errors
//! - PLATY-030-039: Provider errors
//! - PLATY-040-049: Output/reference errors
//! - PLATY-050-059: Execution errors
//! - PLATY-060-069: Config errors
//! - PLATY-090-099: IO/serde passthrough

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatyError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum PlatyError {
    // ═══════════════════════════════════════════
    // STACK FILE ERRORS (001-009)
    // ═══════════════════════════════════════════
    #[error("[PLATY-001] Failed to parse stack: {details}")]
    #[diagnostic(
        code(platy::parse_error),
        help("Check YAML syntax: indentation and quoting")
    )]
    ParseError { details: String },

    #[error("[PLATY-002] Invalid schema version: expected '{expected}', got '{actual}'")]
    #[diagnostic(
        code(platy::invalid_schema),
        help("Use 'platy/stack@0.1' as the schema version")
    )]
    InvalidSchema { expected: String, actual: String },

    #[error("[PLATY-003] Stack file not found: {path}")]
    #[diagnostic(code(platy::stack_not_found), help("Check the file path exists"))]
    StackNotFound { path: String },

    #[error("[PLATY-004] Stack validation failed: {reason}")]
    #[diagnostic(
        code(platy::validation_error),
        help("Check stack structure matches the schema")
    )]
    ValidationError { reason: String },

    #[error("[PLATY-005] Schema validation failed: {details}")]
    #[diagnostic(
        code(platy::schema_failed),
        help("Check YAML against schemas/platy-stack.schema.json")
    )]
    SchemaFailed { details: String },

    // ═══════════════════════════════════════════
    // GRAPH ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[PLATY-020] Resource '{id}' is already registered")]
    #[diagnostic(code(platy::duplicate_resource), help("Pick a unique resource id"))]
    DuplicateResource { id: String },

    #[error("[PLATY-021] Cycle detected in resource graph: {cycle}")]
    #[diagnostic(
        code(platy::cycle_detected),
        help("Remove circular dependencies between resources")
    )]
    CycleDetected { cycle: String },

    #[error("[PLATY-022] Resource '{id}' depends on unknown resource '{dep_id}'")]
    UnknownDependency { id: String, dep_id: String },

    #[error("[PLATY-023] Invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    // ═══════════════════════════════════════════
    // PROVIDER ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[PLATY-030] Provider '{provider}' not configured")]
    ProviderNotConfigured { provider: String },

    #[error("[PLATY-031] Provider '{provider}' error: {reason}")]
    Provider { provider: String, reason: String },

    #[error("[PLATY-032] Resource '{id}' timed out after {timeout_secs}s")]
    ProviderTimeout { id: String, timeout_secs: u64 },

    // ═══════════════════════════════════════════
    // OUTPUT / REFERENCE ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[PLATY-040] Output '{name}' is unresolved: resource '{node_id}' {status}")]
    #[diagnostic(
        code(platy::unresolved_output),
        help("An output resolves only after its source resource succeeds")
    )]
    UnresolvedOutput {
        name: String,
        node_id: String,
        status: String,
    },

    #[error("[PLATY-041] Output '{name}' is already exported")]
    DuplicateOutput { name: String },

    #[error("[PLATY-042] Output '{name}': path '{path}' not found in resource outputs")]
    OutputPathNotFound { name: String, path: String },

    #[error("[PLATY-043] Reference '{reference}' points at unknown resource '{node_id}'")]
    ReferenceNotFound { reference: String, node_id: String },

    #[error("[PLATY-044] Output path '{path}' is not supported (use fields and numeric indices)")]
    PathUnsupported { path: String },

    // ═══════════════════════════════════════════
    // EXECUTION ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[PLATY-050] Execution error: {reason}")]
    Execution { reason: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[PLATY-060] Config error: {reason}")]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERDE ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[PLATY-090] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[PLATY-091] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("[PLATY-092] YAML parse error: {0}")]
    #[diagnostic(
        code(platy::yaml_parse),
        help("Check YAML syntax: indentation must be consistent, strings with special chars need quoting")
    )]
    Yaml(#[from] serde_yaml::Error),
}

impl PlatyError {
    /// Get the error code (e.g., "PLATY-001")
    pub fn code(&self) -> &'static str {
        match self {
            // Stack file errors
            Self::ParseError { .. } => "PLATY-001",
            Self::InvalidSchema { .. } => "PLATY-002",
            Self::StackNotFound { .. } => "PLATY-003",
            Self::ValidationError { .. } => "PLATY-004",
            Self::SchemaFailed { .. } => "PLATY-005",
            // Graph errors
            Self::DuplicateResource { .. } => "PLATY-020",
            Self::CycleDetected { .. } => "PLATY-021",
            Self::UnknownDependency { .. } => "PLATY-022",
            Self::InvalidResourceId { .. } => "PLATY-023",
            // Provider errors
            Self::ProviderNotConfigured { .. } => "PLATY-030",
            Self::Provider { .. } => "PLATY-031",
            Self::ProviderTimeout { .. } => "PLATY-032",
            // Output errors
            Self::UnresolvedOutput { .. } => "PLATY-040",
            Self::DuplicateOutput { .. } => "PLATY-041",
            Self::OutputPathNotFound { .. } => "PLATY-042",
            Self::ReferenceNotFound { .. } => "PLATY-043",
            Self::PathUnsupported { .. } => "PLATY-044",
            // Execution errors
            Self::Execution { .. } => "PLATY-050",
            // Config errors
            Self::ConfigError { .. } => "PLATY-060",
            // IO/serde errors
            Self::Io(_) => "PLATY-090",
            Self::Json(_) => "PLATY-091",
            Self::Yaml(_) => "PLATY-092",
        }
    }

    /// Check if error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::ProviderTimeout { .. }
        )
    }
}

impl FixSuggestion for PlatyError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            PlatyError::ParseError { .. } => Some("Check YAML syntax: indentation and quoting"),
            PlatyError::InvalidSchema { .. } => {
                Some("Use 'platy/stack@0.1' as the schema version")
            }
            PlatyError::StackNotFound { .. } => Some("Check the file path exists"),
            PlatyError::ValidationError { .. } => {
                Some("Check stack structure matches the schema")
            }
            PlatyError::SchemaFailed { .. } => {
                Some("Check YAML against schemas/platy-stack.schema.json")
            }
            PlatyError::DuplicateResource { .. } => {
                Some("Resource ids must be unique within a stack")
            }
            PlatyError::CycleDetected { .. } => {
                Some("Remove circular dependencies between resources")
            }
            PlatyError::UnknownDependency { .. } => {
                Some("Declare the dependency resource or fix the reference")
            }
            PlatyError::InvalidResourceId { .. } => {
                Some("Resource ids must be DNS labels: lowercase letters, digits, hyphens")
            }
            PlatyError::ProviderNotConfigured { .. } => {
                Some("Use a known provider: local, mock")
            }
            PlatyError::Provider { .. } => {
                Some("Check the resource properties and provider availability")
            }
            PlatyError::ProviderTimeout { .. } => {
                Some("Increase the provider timeout or check provider responsiveness")
            }
            PlatyError::UnresolvedOutput { .. } => {
                Some("Outputs resolve only after the source resource succeeds")
            }
            PlatyError::DuplicateOutput { .. } => Some("Use unique output names"),
            PlatyError::OutputPathNotFound { .. } => {
                Some("Check the path exists in the resource's resolved outputs")
            }
            PlatyError::ReferenceNotFound { .. } => {
                Some("References must point at declared resources: ${resource.path}")
            }
            PlatyError::PathUnsupported { .. } => {
                Some("Use simple paths like field.subfield or items.0")
            }
            PlatyError::Execution { .. } => Some("Check the deployment trace for details"),
            PlatyError::ConfigError { .. } => {
                Some("Check ~/.config/platy/config.toml for syntax errors")
            }
            PlatyError::Io(_) => Some("Check file path and permissions"),
            PlatyError::Json(_) => Some("Check JSON syntax"),
            PlatyError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}
