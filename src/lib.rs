//! # botflow - Flow-to-Source Compiler for Chat Bots
//!
//! **botflow** compiles the node graph of a visual bot builder into a complete,
//! runnable Python program for the aiogram Telegram framework. The graph is the
//! only source program; every compile is a full, deterministic regeneration.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Graph**: Parse the editor's JSON export with [`ui::load_project`],
//!     or implement [`project::IntoProject`] for your own format.
//! 2.  **Configure**: Choose [`project::ProjectSettings`] (persistence, comment
//!     annotation, administrator ids), directly or from a `botflow.toml` via [`config`].
//! 3.  **Compile**: `Compiler::builder(project, settings).build().compile()` validates
//!     the graph and, when it is sound, returns the program plus its derived files.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use botflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("project.json")?;
//!     let settings = ProjectSettings::default().with_persistence(true);
//!
//!     let compiler = Compiler::from_editor_json(&json, settings)?;
//!     match compiler.compile() {
//!         Ok(artifact) => artifact.save("out")?,
//!         Err(CompileError::Validation(report)) => {
//!             println!("{}", ReportFormatter::format_report(&report));
//!         }
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod prelude;
pub mod project;
pub mod report;
pub mod runtime;
pub mod ui;
