use super::render::{RenderScope, emit_auto_transition, render_node};
use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::{SourceWriter, py_str};
use crate::project::{NodeKind, NodeRef};
use log::{debug, warn};

/// Emits `navigate_to_node`, the per-target state machine.
///
/// One `if`/`elif` branch per distinct transition target, in the order the
/// index yields them, and a terminal `else` that only logs. Reaching a
/// command node runs that command's handler.
pub struct NavigationGenerator;

impl FragmentGenerator for NavigationGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Navigation
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        let mut provides = vec!["navigate_to_node".to_string()];
        let mut requires = vec!["get_acting_user".to_string()];

        if ctx.flags.needs_auto_chain {
            w.snippet(AUTO_TRANSITION_CONTEXT);
            w.blank();
            w.blank();
            provides.push("AutoTransitionContext".to_string());
        }

        if ctx.flags.needs_inter_sheet {
            emit_sheet_map(&mut w, ctx);
            provides.push("NODE_SHEETS".to_string());
        }

        let targets = ctx.index.transition_targets();
        debug!(targets = targets.len(); "Generating navigation branches");

        w.block(
            "async def navigate_to_node(message, node_id, acting_user=None, callback_query=None, is_auto_transition=False):",
            |w| {
                w.line("\"\"\"Render the node behind `node_id` for the acting user.\"\"\"");
                w.line("acting_user = acting_user or get_acting_user(message, callback_query)");
                if ctx.flags.needs_inter_sheet {
                    w.block("if node_id in NODE_SHEETS:", |w| {
                        w.line("logging.debug(f\"Navigating to {node_id} on sheet {NODE_SHEETS[node_id]}\")");
                    });
                }

                let mut keyword = "if";
                for target in &targets {
                    let Some(node) = ctx.index.node(target) else {
                        warn!(target = target.to_string(); "Transition target vanished from the index");
                        continue;
                    };
                    w.block(
                        format!("{} node_id == {}:", keyword, py_str(ctx.symbols.node(target))),
                        |w| match &node.kind {
                            NodeKind::Start(cmd) | NodeKind::Command(cmd) => {
                                let handler = ctx.symbols.command_handler(cmd.name());
                                w.line(format!("await {}(message, acting_user=acting_user)", handler));
                                requires.push(handler);
                            }
                            _ => {
                                render_node(w, ctx, target, node, &RenderScope::NAVIGATION, &mut requires);
                                emit_auto_transition(w, ctx, target, node, &RenderScope::NAVIGATION, &mut requires);
                            }
                        },
                    );
                    keyword = "elif";
                }

                let warning = "logging.warning(f\"Unknown navigation target: {node_id}\")";
                if keyword == "if" {
                    w.line(warning);
                } else {
                    w.block("else:", |w| {
                        w.line(warning);
                    });
                }
            },
        );

        Fragment::new(self.kind(), w.finish())
            .providing(provides)
            .requiring(requires)
    }
}

fn emit_sheet_map(w: &mut SourceWriter, ctx: &GenerationContext<'_>) {
    w.line("# Sheet that owns each node symbol.");
    w.line("NODE_SHEETS = {");
    w.indent();
    for (sheet, node) in ctx.project.nodes() {
        let node_ref = NodeRef::new(&sheet.id, &node.id);
        w.line(format!(
            "{}: {},",
            py_str(ctx.symbols.node(&node_ref)),
            py_str(&sheet.name)
        ));
    }
    w.dedent();
    w.line("}");
    w.blank();
    w.blank();
}

const AUTO_TRANSITION_CONTEXT: &str = r#"@dataclass
class AutoTransitionContext:
    """Minimal callback context used to chain straight into another node's handler."""
    from_user: Optional[types.User]
    message: types.Message
    data: str

    async def answer(self, *args, **kwargs):
        return None"#;
