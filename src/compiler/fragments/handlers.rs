use super::render::{RenderScope, emit_auto_transition, render_node};
use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::{SourceWriter, py_str};
use crate::project::{ButtonAction, KeyboardKind, NodeRef, command_name};
use ahash::AHashSet;
use itertools::Itertools;
use log::{debug, warn};

/// Emits the dispatcher-facing handlers.
///
/// Registration order matters to aiogram: command handlers first, then the
/// per-target callbacks, command buttons, reply-keyboard routes, the
/// catch-all callback and finally the free-text input consumer.
pub struct HandlerGenerator;

impl FragmentGenerator for HandlerGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Handlers
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        let mut provides = Vec::new();
        let mut requires = vec!["dp".to_string(), "navigate_to_node".to_string()];

        if ctx.flags.needs_input_capture {
            w.line("# Pending input captures: user id -> {variable, node_id, next}.");
            w.line("pending_inputs = {}");
            provides.push("pending_inputs".to_string());
        }

        emit_command_handlers(&mut w, ctx, &mut provides, &mut requires);
        emit_callback_handlers(&mut w, ctx, &mut provides);
        emit_command_buttons(&mut w, ctx, &mut provides, &mut requires);
        if ctx.flags.needs_reply_routing {
            emit_reply_routes(&mut w, ctx, &mut provides, &mut requires);
        }

        separate(&mut w);
        w.snippet(UNROUTED_CALLBACK);
        provides.push("handle_unrouted_callback".to_string());

        if ctx.flags.needs_input_capture {
            separate(&mut w);
            emit_input_consumer(&mut w, ctx);
            provides.push("handle_user_input".to_string());
            requires.push("init_user_variables".to_string());
            if ctx.flags.needs_persistence {
                requires.push("update_user_field_in_db".to_string());
            }
        }

        debug!(handlers = provides.len(); "Generated handlers");
        Fragment::new(self.kind(), w.finish())
            .providing(provides)
            .requiring(requires.into_iter().unique())
    }
}

/// Two blank lines between top-level definitions, none before the first.
fn separate(w: &mut SourceWriter) {
    if !w.is_empty() {
        w.blank();
        w.blank();
    }
}

fn emit_command_handlers(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    provides: &mut Vec<String>,
    requires: &mut Vec<String>,
) {
    let mut seen = AHashSet::new();
    for (sheet, node) in ctx.project.nodes() {
        let Some(cmd) = node.kind.command() else {
            continue;
        };
        if !seen.insert(cmd.name()) {
            continue;
        }
        let node_ref = NodeRef::new(&sheet.id, &node.id);
        let handler = ctx.symbols.command_handler(cmd.name());

        separate(w);
        w.line(format!("@dp.message(Command({}))", py_str(cmd.name())));
        w.block(
            format!("async def {}(message: types.Message, acting_user=None):", handler),
            |w| {
                w.line(format!(
                    "\"\"\"Handle /{}.\"\"\"",
                    ctx.symbols.command(cmd.name())
                ));
                w.line("acting_user = acting_user or message.from_user");
                w.block("if acting_user is None:", |w| {
                    w.line("return");
                });
                if cmd.admin_only {
                    w.block("if not is_admin(acting_user.id):", |w| {
                        w.line("await message.answer(\"This command is available to administrators only.\")");
                        w.line("return");
                    });
                    requires.push("is_admin".to_string());
                }
                if cmd.private_only {
                    w.block("if not is_private_chat(message):", |w| {
                        w.line("await message.answer(\"This command works in private chats only.\")");
                        w.line("return");
                    });
                    requires.push("is_private_chat".to_string());
                }
                if cmd.auth_required {
                    w.block("if not await check_auth(acting_user.id):", |w| {
                        w.line("await message.answer(\"Please send /start first.\")");
                        w.line("return");
                    });
                    requires.push("check_auth".to_string());
                }
                if ctx.flags.needs_persistence {
                    w.line("await save_user_to_db(acting_user.id, acting_user.username, acting_user.first_name, acting_user.last_name)");
                    requires.push("save_user_to_db".to_string());
                }
                w.line("init_user_variables(acting_user)");
                requires.push("init_user_variables".to_string());

                render_node(w, ctx, &node_ref, node, &RenderScope::COMMAND, requires);
                emit_auto_transition(w, ctx, &node_ref, node, &RenderScope::COMMAND, requires);
            },
        );
        provides.push(handler);
    }
}

fn emit_callback_handlers(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    provides: &mut Vec<String>,
) {
    for target in ctx.index.transition_targets() {
        let symbol = ctx.symbols.node(&target);
        let handler = ctx.symbols.callback_handler(&target);
        separate(w);
        w.line(format!("@dp.callback_query(F.data == {})", py_str(symbol)));
        w.block(
            format!("async def {}(callback_query, is_auto_transition=False):", handler),
            |w| {
                w.line("await callback_query.answer()");
                w.line(format!(
                    "await navigate_to_node(callback_query.message, {}, callback_query.from_user, callback_query, is_auto_transition)",
                    py_str(symbol)
                ));
            },
        );
        provides.push(handler);
    }
}

/// Inline buttons that run a command reach it through `cmd:<name>` data.
fn emit_command_buttons(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    provides: &mut Vec<String>,
    requires: &mut Vec<String>,
) {
    let known = defined_commands(ctx);
    let commands: Vec<&str> = ctx
        .project
        .nodes()
        .filter(|(_, node)| node.kind.message().keyboard.kind == KeyboardKind::Inline)
        .flat_map(|(_, node)| node.kind.message().keyboard.buttons.iter())
        .filter_map(|button| match &button.action {
            ButtonAction::Command { command } => Some(command_name(command)),
            _ => None,
        })
        .unique()
        .collect();

    for command in commands {
        separate(w);
        w.line(format!(
            "@dp.callback_query(F.data == {})",
            py_str(&ctx.symbols.command_callback_data(command))
        ));
        let handler = ctx.symbols.command_button_handler(command);
        w.block(format!("async def {}(callback_query):", handler), |w| {
            w.line("await callback_query.answer()");
            if !known.contains(command) {
                warn!(command = command; "Inline button runs a command no node defines");
                w.line(format!(
                    "logging.warning({})",
                    py_str(&format!("No handler for command /{}", command))
                ));
            } else if ctx.flags.needs_persistence {
                let alias = ctx.symbols.command_alias(command);
                w.line(format!("await {}(callback_query)", alias));
                requires.push(alias);
            } else {
                let target = ctx.symbols.command_handler(command);
                w.line(format!(
                    "await {}(callback_query.message, acting_user=callback_query.from_user)",
                    target
                ));
                requires.push(target);
            }
        });
        provides.push(handler);
    }
}

/// Reply keyboards send their label as plain text; each label gets a route.
fn emit_reply_routes(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    provides: &mut Vec<String>,
    requires: &mut Vec<String>,
) {
    let known = defined_commands(ctx);
    let mut labels = AHashSet::new();
    for (sheet, node) in ctx.project.nodes() {
        let keyboard = &node.kind.message().keyboard;
        if keyboard.kind != KeyboardKind::Reply {
            continue;
        }
        let node_ref = NodeRef::new(&sheet.id, &node.id);
        for (index, button) in keyboard.buttons.iter().enumerate() {
            let call = match &button.action {
                ButtonAction::Goto { target } => {
                    let Ok(target) = ctx.index.resolve(&sheet.id, target) else {
                        continue;
                    };
                    format!(
                        "await navigate_to_node(message, {}, message.from_user)",
                        py_str(ctx.symbols.node(&target))
                    )
                }
                ButtonAction::Command { command } if known.contains(command_name(command)) => {
                    let handler = ctx.symbols.command_handler(command_name(command));
                    let call = format!("await {}(message, acting_user=message.from_user)", handler);
                    requires.push(handler);
                    call
                }
                _ => continue,
            };
            if !labels.insert(button.text.as_str()) {
                warn!(
                    node = node_ref.to_string(),
                    label = button.text.as_str();
                    "Reply button label already routed; later button ignored"
                );
                continue;
            }
            let handler = ctx.symbols.reply_handler(&node_ref, index);
            separate(w);
            w.line(format!("@dp.message(F.text == {})", py_str(&button.text)));
            w.block(format!("async def {}(message: types.Message):", handler), |w| {
                w.line(call);
            });
            provides.push(handler);
        }
    }
}

fn defined_commands<'a>(ctx: &GenerationContext<'a>) -> AHashSet<&'a str> {
    ctx.project
        .nodes()
        .filter_map(|(_, node)| node.kind.command())
        .map(|cmd| cmd.name())
        .collect()
}

fn emit_input_consumer(w: &mut SourceWriter, ctx: &GenerationContext<'_>) {
    w.line("@dp.message(F.text)");
    w.block("async def handle_user_input(message: types.Message):", |w| {
        w.line("\"\"\"Store the answer to a pending input prompt and move on.\"\"\"");
        w.line("user = message.from_user");
        w.line("pending = pending_inputs.pop(user.id, None) if user is not None else None");
        w.block("if pending is None:", |w| {
            w.line("return");
        });
        w.line("variables = init_user_variables(user)");
        w.line("variables[pending[\"variable\"]] = message.text");
        if ctx.flags.needs_persistence {
            w.line("await update_user_field_in_db(user.id, pending[\"variable\"], message.text)");
        }
        w.line("logging.info(f\"Stored {pending['variable']} for user {user.id}\")");
        w.block("if pending[\"next\"]:", |w| {
            w.line("await navigate_to_node(message, pending[\"next\"], user)");
        });
    });
}

const UNROUTED_CALLBACK: &str = r#"@dp.callback_query()
async def handle_unrouted_callback(callback_query: types.CallbackQuery):
    """Send any other callback data through navigation; unknown data only logs."""
    await callback_query.answer()
    await navigate_to_node(callback_query.message, callback_query.data, callback_query.from_user, callback_query)"#;
