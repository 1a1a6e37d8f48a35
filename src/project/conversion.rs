use super::definition::Project;
use crate::error::ProjectConversionError;

/// A trait for editor-side data models that can be converted into a botflow `Project`.
///
/// This is the seam between whatever shape the editor persists and the closed
/// node model the compiler works on. Implement it on your own top-level struct
/// and hand the result to `Compiler::builder`.
///
/// # Example
///
/// ```rust,no_run
/// use botflow::prelude::*;
/// use botflow::error::ProjectConversionError;
///
/// struct MyEditorDump { greeting: String }
///
/// impl IntoProject for MyEditorDump {
///     fn into_project(self) -> std::result::Result<Project, ProjectConversionError> {
///         let start = Node {
///             id: "start".to_string(),
///             position: Position::default(),
///             kind: NodeKind::Start(CommandPayload {
///                 command: "/start".to_string(),
///                 reply: MessagePayload { text: self.greeting, ..Default::default() },
///                 ..Default::default()
///             }),
///         };
///         Ok(Project {
///             name: "Greeter".to_string(),
///             sheets: vec![Sheet {
///                 id: "main".to_string(),
///                 name: "Main".to_string(),
///                 nodes: vec![start],
///                 connections: vec![],
///             }],
///             ..Default::default()
///         })
///     }
/// }
/// ```
pub trait IntoProject {
    /// Consumes the object and converts it into a compilable project graph.
    fn into_project(self) -> Result<Project, ProjectConversionError>;
}

impl IntoProject for Project {
    fn into_project(self) -> Result<Project, ProjectConversionError> {
        Ok(self)
    }
}
