use crate::compiler::flags::FeatureFlags;
use crate::project::{CompilationArtifact, PROGRAM_FILE, ValidationReport};

/// Formats validation reports and compile summaries into human-readable strings
pub struct ReportFormatter;

impl ReportFormatter {
    /// One line when the graph is valid, otherwise a numbered list of defects.
    pub fn format_report(report: &ValidationReport) -> String {
        if report.valid {
            return "Project is valid".to_string();
        }
        let mut result = format!("Project has {} error(s):", report.errors.len());
        for (i, error) in report.errors.iter().enumerate() {
            result.push_str(&format!("\n  {}. {}", i + 1, error));
        }
        result
    }

    /// Lists the optional fragments a compile pulls in, or says none are needed.
    pub fn format_flags(flags: &FeatureFlags) -> String {
        let enabled: Vec<&str> = [
            (flags.needs_persistence, "persistence"),
            (flags.needs_safe_send, "safe send"),
            (flags.needs_comment_annotation, "comments"),
            (flags.needs_inter_sheet, "inter-sheet"),
            (flags.needs_input_capture, "input capture"),
            (flags.needs_groups, "groups"),
            (flags.needs_reply_routing, "reply routing"),
            (flags.needs_auto_chain, "auto-transitions"),
            (flags.needs_menu, "command menu"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        if enabled.is_empty() {
            "Features: none".to_string()
        } else {
            format!("Features: {}", enabled.join(", "))
        }
    }

    /// Summary printed after a successful compile.
    pub fn format_summary(artifact: &CompilationArtifact, flags: &FeatureFlags) -> String {
        let mut result = format!(
            "{}: {} lines\n{}",
            PROGRAM_FILE,
            artifact.code().lines().count(),
            Self::format_flags(flags)
        );
        for file in artifact.files() {
            result.push_str(&format!("\n  + {} ({} bytes)", file.path, file.contents.len()));
        }
        result
    }
}
