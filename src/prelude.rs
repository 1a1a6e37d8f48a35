//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load, configure and compile a project.
//!
//! # Example
//!
//! ```rust,no_run
//! use botflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/project.json")?;
//! let compiler = Compiler::from_editor_json(&json, ProjectSettings::default())?;
//!
//! let report = compiler.validate();
//! println!("{}", ReportFormatter::format_report(&report));
//!
//! let artifact = compiler.compile()?;
//! println!("{}", artifact.code());
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::flags::FeatureFlags;
pub use crate::compiler::{Compiler, CompilerBuilder};

// Project model
pub use crate::project::{
    AttachedMedia, Button, ButtonAction, CommandPayload, CompilationArtifact, Connection,
    GroupConfig, InputPayload, IntoProject, Keyboard, KeyboardKind, MediaKind, MediaPayload,
    MessagePayload, Node, NodeKind, NodeRef, Position, Project, ProjectSettings, Sheet,
    ValidationReport,
};

// Error types
pub use crate::error::{CompileError, ProjectConversionError};

// Reporting
pub use crate::report::ReportFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
