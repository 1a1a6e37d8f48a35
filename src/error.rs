use crate::project::ValidationReport;
use itertools::Itertools;
use thiserror::Error;

/// Errors that can occur during the compilation phase.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("Failed to parse project JSON: {0}")]
    JsonParseError(String),

    #[error("Project failed validation with {} error(s)", .0.errors.len())]
    Validation(ValidationReport),

    #[error("Project conversion failed: {0}")]
    Conversion(#[from] ProjectConversionError),
}

impl CompileError {
    /// The validation report, when this error came from a failed validation.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            CompileError::Validation(report) => Some(report),
            _ => None,
        }
    }
}

/// A single structural defect found by the validator.
///
/// The `Display` text is what ends up in `ValidationReport::errors`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Project has no start command node")]
    MissingStartNode,

    #[error("Command '/{command}' is defined by {count} nodes: {}", .nodes.join(", "))]
    DuplicateCommand {
        command: String,
        count: usize,
        nodes: Vec<String>,
    },

    #[error("Node id '{node_id}' is used more than once on sheet '{sheet}'")]
    DuplicateNodeId { sheet: String, node_id: String },

    #[error("Connection {source_id} -> {target_id}: {endpoint} node '{missing}' not found{}", scope_suffix(.sheet))]
    DanglingConnection {
        source_id: String,
        target_id: String,
        endpoint: Endpoint,
        missing: String,
        sheet: Option<String>,
    },

    #[error("Node '{node_id}' auto-transitions to '{target}', which {reason}")]
    UnresolvedAutoTransition {
        node_id: String,
        target: String,
        reason: ResolutionFailure,
    },

    #[error("Auto-transitions that collect input form a cycle: {}", cycle_path(.nodes))]
    AutoTransitionCycle { nodes: Vec<String> },

    #[error("Command '/{command}' on node '{node_id}' cannot be shown in the menu: names must be 1 to 32 characters of a-z, 0-9 and _")]
    InvalidMenuCommand { node_id: String, command: String },

    #[error("Node '{node_id}' has no message text")]
    EmptyMessageText { node_id: String },

    #[error("Button '{button}' on node '{node_id}' points to '{target}', which {reason}")]
    UnresolvedButtonTarget {
        node_id: String,
        button: String,
        target: String,
        reason: ResolutionFailure,
    },

    #[error("Input node '{node_id}' continues to '{target}', which {reason}")]
    UnresolvedInputTarget {
        node_id: String,
        target: String,
        reason: ResolutionFailure,
    },
}

/// `A -> B -> A`: the cycle closed on its first node.
fn cycle_path(nodes: &[String]) -> String {
    nodes.iter().chain(nodes.first()).join(" -> ")
}

fn scope_suffix(sheet: &Option<String>) -> String {
    sheet
        .as_ref()
        .map(|s| format!(" on sheet '{}'", s))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Why a node reference could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    NotFound,
    Ambiguous(usize),
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionFailure::NotFound => write!(f, "does not exist"),
            ResolutionFailure::Ambiguous(n) => write!(f, "matches {} nodes on other sheets", n),
        }
    }
}

/// Errors that can occur when converting an editor format into a botflow `Project`.
#[derive(Error, Debug, Clone)]
pub enum ProjectConversionError {
    #[error("Invalid editor data: {0}")]
    ValidationError(String),

    #[error("Node '{node_id}' has an unknown type: '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Node '{node_id}' is missing required field '{field}'")]
    MissingField { node_id: String, field: &'static str },
}

/// Errors raised while writing or serializing compilation artifacts.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Could not write '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(String),

    #[error("Could not read configuration file '{path}': {message}")]
    Read { path: String, message: String },
}
