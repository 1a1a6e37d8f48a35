//! Emission of a node's reaction: text, keyboard, media and chaining.
//!
//! Shared by the command handlers and the navigation branches so both render
//! a node the same way.

use super::GenerationContext;
use crate::compiler::emit::{SourceWriter, py_bool, py_opt_str, py_str};
use crate::project::{
    ButtonAction, KeyboardKind, MessagePayload, Node, NodeKind, NodeRef, command_name,
};
use crate::runtime;
use log::{debug, warn};

/// Python expressions naming the update context inside the emitting scope.
pub(super) struct RenderScope {
    pub message: &'static str,
    pub acting_user: &'static str,
    pub callback_query: &'static str,
    pub is_auto_transition: &'static str,
}

impl RenderScope {
    /// Scope of a command handler: no callback, never an auto-transition.
    pub(super) const COMMAND: RenderScope = RenderScope {
        message: "message",
        acting_user: "acting_user",
        callback_query: "None",
        is_auto_transition: "False",
    };

    /// Scope of `navigate_to_node`.
    pub(super) const NAVIGATION: RenderScope = RenderScope {
        message: "message",
        acting_user: "acting_user",
        callback_query: "callback_query",
        is_auto_transition: "is_auto_transition",
    };
}

/// Emits the statements that render `node`. Identifiers the emitted code calls
/// outside its own fragment are pushed onto `requires`.
pub(super) fn render_node(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    node_ref: &NodeRef,
    node: &Node,
    scope: &RenderScope,
    requires: &mut Vec<String>,
) {
    let message = node.kind.message();
    let symbol = ctx.symbols.node(node_ref);
    report_placeholders(ctx, node_ref, message);

    w.line(format!(
        "text = await render_text({}, {}, {}, {})",
        py_str(&message.text),
        scope.message,
        scope.callback_query,
        scope.acting_user
    ));
    requires.push("render_text".to_string());

    let has_keyboard = emit_keyboard(w, ctx, node_ref, message);
    let kwargs = send_kwargs(has_keyboard, message.markdown);

    match &node.kind {
        NodeKind::Media(media) => {
            w.line(format!(
                "await bot.{}({}.chat.id, {}={}, caption=text{})",
                media.media_kind.send_method(),
                scope.message,
                media.media_kind.argument(),
                py_str(&media.source),
                kwargs
            ));
        }
        _ if !message.attached_media.is_empty() => {
            emit_attached_media(w, ctx, symbol, message, scope, &kwargs, requires);
        }
        _ => emit_send_text(w, ctx, symbol, scope, &kwargs, requires),
    }

    if let NodeKind::Input(input) = &node.kind {
        let next = input
            .next
            .as_deref()
            .and_then(|id| ctx.index.resolve(&node_ref.sheet, id).ok())
            .map(|r| ctx.symbols.node(&r).to_string());
        w.block(format!("if {} is not None:", scope.acting_user), |w| {
            w.line(format!(
                "pending_inputs[{}.id] = {{\"variable\": {}, \"node_id\": {}, \"next\": {}}}",
                scope.acting_user,
                py_str(&input.variable),
                py_str(symbol),
                py_opt_str(next.as_deref())
            ));
        });
        requires.push("pending_inputs".to_string());
    }
}

/// Emits the auto-transition step of a node, if it has one.
///
/// A chain is followed only when the node collects user input; it then calls
/// the target's callback handler directly with an explicit context record.
/// Otherwise only a log line is emitted.
pub(super) fn emit_auto_transition(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    node_ref: &NodeRef,
    node: &Node,
    scope: &RenderScope,
    requires: &mut Vec<String>,
) {
    let Some(target) = ctx.index.auto_transition(node_ref) else {
        return;
    };
    let source = ctx.symbols.node(node_ref);
    let target_symbol = ctx.symbols.node(&target);

    if node.kind.message().collect_user_input {
        let handler = ctx.symbols.callback_handler(&target);
        w.line(format!(
            "logging.info({})",
            py_str(&format!("Auto-transition from {} to {}", source, target_symbol))
        ));
        w.line(format!(
            "context = AutoTransitionContext(from_user={}, message={}, data={})",
            scope.acting_user,
            scope.message,
            py_str(target_symbol)
        ));
        w.line(format!("await {}(context, is_auto_transition=True)", handler));
        requires.extend(["AutoTransitionContext".to_string(), handler]);
    } else {
        w.line(format!(
            "logging.info({})",
            py_str(&format!(
                "Node {} does not collect user input; auto-transition to {} not followed",
                source, target_symbol
            ))
        ));
    }
}

fn send_kwargs(has_keyboard: bool, markdown: bool) -> String {
    let mut kwargs = String::new();
    if has_keyboard {
        kwargs.push_str(", reply_markup=keyboard");
    }
    if markdown {
        kwargs.push_str(", parse_mode=ParseMode.MARKDOWN");
    }
    kwargs
}

fn emit_send_text(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    symbol: &str,
    scope: &RenderScope,
    kwargs: &str,
    requires: &mut Vec<String>,
) {
    if ctx.flags.needs_safe_send {
        w.line(format!(
            "await safe_edit_or_send({}, text, callback_query={}, node_id={}, is_auto_transition={}, acting_user={}{})",
            scope.message,
            scope.callback_query,
            py_str(symbol),
            scope.is_auto_transition,
            scope.acting_user,
            kwargs
        ));
        requires.push("safe_edit_or_send".to_string());
    } else {
        w.line(format!("await {}.answer(text{})", scope.message, kwargs));
    }
}

/// Prefers a media message captioned with the text; falls back to text only,
/// with a warning, when the media variable is not set for the user.
fn emit_attached_media(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    symbol: &str,
    message: &MessagePayload,
    scope: &RenderScope,
    kwargs: &str,
    requires: &mut Vec<String>,
) {
    let Some(media) = message.attached_media.first() else {
        return;
    };
    if message.attached_media.len() > 1 {
        warn!(
            node = symbol,
            attached = message.attached_media.len();
            "Only the first attached media is sent"
        );
    }
    w.line(format!(
        "variables = await get_user_variables({0}) if {0} is not None else {{}}",
        scope.acting_user
    ));
    w.line(format!("media_value = variables.get({})", py_str(&media.variable)));
    w.block("if media_value:", |w| {
        w.line(format!(
            "await bot.{}({}.chat.id, {}=media_value, caption=text{})",
            media.kind.send_method(),
            scope.message,
            media.kind.argument(),
            kwargs
        ));
    });
    w.block("else:", |w| {
        w.line(format!(
            "logging.warning({})",
            py_str(&format!(
                "Media variable '{}' is not set for node {}, sending text only",
                media.variable, symbol
            ))
        ));
        emit_send_text(w, ctx, symbol, scope, kwargs, requires);
    });
    requires.push("get_user_variables".to_string());
}

/// Emits `keyboard = ...` for the node's keyboard. Returns false when there is
/// nothing to attach.
fn emit_keyboard(
    w: &mut SourceWriter,
    ctx: &GenerationContext<'_>,
    node_ref: &NodeRef,
    message: &MessagePayload,
) -> bool {
    let keyboard = &message.keyboard;
    if keyboard.kind == KeyboardKind::None || keyboard.buttons.is_empty() {
        return false;
    }

    match keyboard.kind {
        KeyboardKind::Inline => {
            let buttons: Vec<String> = keyboard
                .buttons
                .iter()
                .filter_map(|button| inline_button(ctx, node_ref, &button.text, &button.action))
                .collect();
            if buttons.is_empty() {
                return false;
            }
            w.line("builder = InlineKeyboardBuilder()");
            for button in buttons {
                w.line(format!("builder.add({})", button));
            }
            w.line("builder.adjust(1)");
            w.line("keyboard = builder.as_markup()");
        }
        KeyboardKind::Reply => {
            w.line("builder = ReplyKeyboardBuilder()");
            for button in &keyboard.buttons {
                let extra = match button.action {
                    ButtonAction::RequestContact => ", request_contact=True",
                    ButtonAction::RequestLocation => ", request_location=True",
                    _ => "",
                };
                w.line(format!(
                    "builder.add(KeyboardButton(text={}{}))",
                    py_str(&button.text),
                    extra
                ));
            }
            w.line("builder.adjust(1)");
            w.line(format!(
                "keyboard = builder.as_markup(resize_keyboard={}, one_time_keyboard={})",
                py_bool(keyboard.resize),
                py_bool(keyboard.one_time)
            ));
        }
        KeyboardKind::None => return false,
    }
    true
}

fn inline_button(
    ctx: &GenerationContext<'_>,
    node_ref: &NodeRef,
    text: &str,
    action: &ButtonAction,
) -> Option<String> {
    let text = py_str(text);
    match action {
        ButtonAction::Goto { target } => {
            let target = ctx.index.resolve(&node_ref.sheet, target).ok()?;
            Some(format!(
                "InlineKeyboardButton(text={}, callback_data={})",
                text,
                py_str(ctx.symbols.node(&target))
            ))
        }
        ButtonAction::Url { url } => Some(format!(
            "InlineKeyboardButton(text={}, url={})",
            text,
            py_str(url)
        )),
        ButtonAction::Command { command } => Some(format!(
            "InlineKeyboardButton(text={}, callback_data={})",
            text,
            py_str(&ctx.symbols.command_callback_data(command_name(command)))
        )),
        ButtonAction::RequestContact | ButtonAction::RequestLocation => {
            warn!(
                node = node_ref.to_string(),
                button = text;
                "Contact and location requests need a reply keyboard; button skipped"
            );
            None
        }
    }
}

fn report_placeholders(ctx: &GenerationContext<'_>, node_ref: &NodeRef, message: &MessagePayload) {
    let names = runtime::placeholders(&message.text);
    if names.is_empty() {
        return;
    }
    debug!(node = node_ref.to_string(), variables = names.join(", "); "Node reads variables");
    let captured = captured_variables(ctx);
    for name in names
        .iter()
        .filter(|n| !runtime::is_builtin(n) && !captured.contains(n))
    {
        warn!(
            node = node_ref.to_string(),
            variable = name.as_str();
            "Placeholder is never captured by an input node and may stay unreplaced"
        );
    }
}

fn captured_variables(ctx: &GenerationContext<'_>) -> Vec<String> {
    ctx.project
        .nodes()
        .filter_map(|(_, node)| match &node.kind {
            NodeKind::Input(input) => Some(input.variable.clone()),
            _ => None,
        })
        .collect()
}
