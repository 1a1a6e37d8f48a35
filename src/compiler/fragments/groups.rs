use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::{SourceWriter, py_bool, py_str};
use crate::compiler::flags::FeatureFlags;
use itertools::Itertools;

/// Emits the static `CONNECTED_GROUPS` table. Absent when no group is configured.
pub struct GroupGenerator;

impl FragmentGenerator for GroupGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Groups
    }

    fn is_enabled(&self, flags: &FeatureFlags) -> bool {
        flags.needs_groups
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        w.line("CONNECTED_GROUPS = {");
        w.indent();
        for group in &ctx.project.groups {
            w.line(format!("{}: {{", py_str(&group.id)));
            w.indent();
            w.line(format!("\"name\": {},", py_str(&group.name)));
            w.line(format!("\"is_admin\": {},", py_bool(group.is_admin)));
            w.line(format!("\"chat_type\": {},", py_str(&group.chat_type)));
            w.line(format!(
                "\"rights\": [{}],",
                group.rights.iter().map(|r| py_str(r)).join(", ")
            ));
            w.line(format!("\"description\": {},", py_str(&group.description)));
            w.dedent();
            w.line("},");
        }
        w.dedent();
        w.line("}");

        Fragment::new(self.kind(), w.finish()).providing(["CONNECTED_GROUPS"])
    }
}
