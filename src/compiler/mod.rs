use crate::error::CompileError;
use crate::project::{CompilationArtifact, Project, ProjectSettings, ValidationReport};
use ahash::AHashMap;
use log::{debug, info};

mod annotator;
mod assembler;
mod derived;
pub mod emit;
pub mod flags;
pub mod fragments;
pub mod resolve;
pub mod symbols;
pub mod validator;

pub use annotator::{ANNOTATION_MARKER, annotate, strip_annotations};
pub use derived::{DOCKERFILE, ENV_FILE, README_FILE, REQUIREMENTS_FILE};

use assembler::Assembler;
use flags::FeatureFlags;
use fragments::{FragmentGenerator, FragmentKind, GenerationContext, default_generators};
use resolve::ProjectIndex;
use symbols::SymbolTable;
use validator::Validator;

/// Turns a project graph into a runnable aiogram program.
///
/// Holds a snapshot of the graph; every call to [`Compiler::compile`] is a full
/// regeneration and leaves the compiler untouched.
pub struct Compiler {
    project: Project,
    settings: ProjectSettings,
    display_name: String,
    generators: AHashMap<FragmentKind, Box<dyn FragmentGenerator>>,
}

pub struct CompilerBuilder {
    project: Project,
    settings: ProjectSettings,
    display_name: Option<String>,
    generators: AHashMap<FragmentKind, Box<dyn FragmentGenerator>>,
}

impl CompilerBuilder {
    pub fn new(project: Project, settings: ProjectSettings) -> Self {
        let generators = default_generators()
            .into_iter()
            .map(|g| (g.kind(), g))
            .collect();
        Self {
            project,
            settings,
            display_name: None,
            generators,
        }
    }

    /// Name used in the program header and the usage guide. Defaults to the project name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Replaces the default generator for the same fragment kind.
    pub fn with_generator(mut self, generator: Box<dyn FragmentGenerator>) -> Self {
        self.generators.insert(generator.kind(), generator);
        self
    }

    pub fn build(self) -> Compiler {
        let display_name = self
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.project.name.clone());
        Compiler {
            project: self.project,
            settings: self.settings,
            display_name,
            generators: self.generators,
        }
    }
}

impl Compiler {
    pub fn builder(project: Project, settings: ProjectSettings) -> CompilerBuilder {
        CompilerBuilder::new(project, settings)
    }

    /// Builds a compiler straight from the editor's JSON export.
    pub fn from_editor_json(json: &str, settings: ProjectSettings) -> Result<Self, CompileError> {
        let project = crate::ui::load_project(json)?;
        Ok(Self::builder(project, settings).build())
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Runs the structural checks without generating anything.
    pub fn validate(&self) -> ValidationReport {
        let index = ProjectIndex::new(&self.project);
        Validator::new(&self.project, &index).validate()
    }

    /// The flags a compile of the current graph would use.
    pub fn feature_flags(&self) -> FeatureFlags {
        let index = ProjectIndex::new(&self.project);
        FeatureFlags::resolve(&index, &self.settings)
    }

    /// Validates, then generates the program and its derived files.
    ///
    /// On a failed validation no code is produced; the report comes back
    /// inside [`CompileError::Validation`].
    pub fn compile(&self) -> Result<CompilationArtifact, CompileError> {
        info!(project = self.project.name.as_str(), sheets = self.project.sheets.len(); "Compiling project");

        let index = ProjectIndex::new(&self.project);
        let report = Validator::new(&self.project, &index).validate();
        if !report.valid {
            info!(errors = report.errors.len(); "Validation failed, no code emitted");
            return Err(CompileError::Validation(report));
        }

        let flags = FeatureFlags::resolve(&index, &self.settings);
        debug!(flags:? = flags; "Resolved feature flags");

        let symbols = SymbolTable::build(&self.project);
        debug!(nodes = symbols.node_count(), commands = symbols.command_count(); "Built symbol table");

        let ctx = GenerationContext {
            project: &self.project,
            index: &index,
            symbols: &symbols,
            flags: &flags,
            settings: &self.settings,
            display_name: &self.display_name,
        };

        let mut kinds: Vec<FragmentKind> = self.generators.keys().copied().collect();
        kinds.sort();
        let fragments = kinds
            .into_iter()
            .filter_map(|kind| self.generators.get(&kind))
            .filter(|g| g.is_enabled(&flags))
            .map(|g| {
                let fragment = g.generate(&ctx);
                debug!(fragment = fragment.kind.name(), lines = fragment.lines.len(); "Generated fragment");
                fragment
            })
            .collect();

        let assembler = Assembler::new(fragments);
        let code = if flags.needs_comment_annotation {
            assembler.assemble(|f| annotate(&f.lines, f.kind.name()))
        } else {
            assembler.assemble(|f| f.lines.clone())
        };

        let files = derived::derived_files(&flags, &self.display_name);
        info!(
            fragments = assembler.fragments().len(),
            bytes = code.len(),
            files = files.len();
            "Compilation finished"
        );
        Ok(CompilationArtifact::new(code, report, files))
    }
}
