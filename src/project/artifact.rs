use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the emitted bot program inside an artifact bundle.
pub const PROGRAM_FILE: &str = "bot.py";

/// The outcome of validating a project graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// A file produced alongside the program (dependency manifest, usage guide, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub path: String,
    pub contents: String,
}

/// Everything a successful compile produces. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationArtifact {
    code: String,
    report: ValidationReport,
    files: Vec<ArtifactFile>,
}

impl CompilationArtifact {
    pub(crate) fn new(code: String, report: ValidationReport, files: Vec<ArtifactFile>) -> Self {
        Self {
            code,
            report,
            files,
        }
    }

    /// The emitted program source.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Derived files, not including the program itself.
    pub fn files(&self) -> &[ArtifactFile] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&ArtifactFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// The success half of the output contract: `{ "code": "..." }`.
    pub fn to_json(&self) -> Result<String, ArtifactError> {
        serde_json::to_string_pretty(&serde_json::json!({ "code": self.code }))
            .map_err(|e| ArtifactError::Serialization(e.to_string()))
    }

    /// Writes the program and every derived file into `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| ArtifactError::Io {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let program = std::iter::once((PROGRAM_FILE, self.code.as_str()));
        let derived = self.files.iter().map(|f| (f.path.as_str(), f.contents.as_str()));

        for (name, contents) in program.chain(derived) {
            let path = dir.join(name);
            fs::write(&path, contents).map_err(|e| ArtifactError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}
