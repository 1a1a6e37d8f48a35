use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::SourceWriter;
use crate::compiler::flags::FeatureFlags;

/// Emits `safe_edit_or_send` and the best-effort outgoing message log.
///
/// Reply keyboards and auto-transitions always get a fresh message; otherwise
/// the originating message is edited in place, falling back to a new message
/// when the edit is rejected. Logging failures are swallowed.
pub struct SafeSendGenerator;

impl FragmentGenerator for SafeSendGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::SafeSend
    }

    fn is_enabled(&self, flags: &FeatureFlags) -> bool {
        flags.needs_safe_send
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        w.snippet(COLLECT_BUTTONS);
        w.blank();
        w.blank();
        w.block(
            "async def log_outgoing_message(message, text, node_id=None, reply_markup=None, acting_user=None):",
            |w| {
                w.line("\"\"\"Record an outgoing message together with its buttons. Never raises.\"\"\"");
                w.block("try:", |w| {
                    w.line("buttons = collect_keyboard_buttons(reply_markup)");
                    w.line("message_data = {\"buttons\": buttons} if buttons else {}");
                    if ctx.flags.needs_persistence {
                        w.line("user_id = acting_user.id if acting_user is not None else message.chat.id");
                        w.line("await save_message_to_db(user_id, \"bot\", text, node_id, message_data)");
                    } else {
                        w.line("logging.debug(f\"Outgoing message for node {node_id}: {message_data}\")");
                    }
                });
                w.block("except Exception as e:", |w| {
                    w.line("logging.warning(f\"Could not record outgoing message: {e}\")");
                });
            },
        );
        w.blank();
        w.blank();
        w.snippet(SAFE_EDIT_OR_SEND);

        let mut requires = Vec::new();
        if ctx.flags.needs_persistence {
            requires.push("save_message_to_db");
        }
        Fragment::new(self.kind(), w.finish())
            .providing([
                "collect_keyboard_buttons",
                "log_outgoing_message",
                "safe_edit_or_send",
            ])
            .requiring(requires)
    }
}

const COLLECT_BUTTONS: &str = r#"def collect_keyboard_buttons(reply_markup) -> list:
    """Describe the buttons of an outgoing keyboard for the message log."""
    buttons = []
    if isinstance(reply_markup, InlineKeyboardMarkup):
        for row in reply_markup.inline_keyboard:
            for button in row:
                buttons.append({
                    "text": button.text,
                    "callback_data": button.callback_data,
                    "url": button.url,
                })
    elif isinstance(reply_markup, ReplyKeyboardMarkup):
        for row in reply_markup.keyboard:
            for button in row:
                buttons.append({
                    "text": button.text,
                    "request_contact": bool(button.request_contact),
                    "request_location": bool(button.request_location),
                })
    return buttons"#;

const SAFE_EDIT_OR_SEND: &str = r#"async def safe_edit_or_send(message, text, callback_query=None, node_id=None, is_auto_transition=False, acting_user=None, **kwargs):
    """Edit the message behind a callback in place, or send a fresh one."""
    reply_markup = kwargs.get("reply_markup")
    is_reply_keyboard = isinstance(reply_markup, (ReplyKeyboardMarkup, ReplyKeyboardRemove))
    if is_auto_transition or is_reply_keyboard or callback_query is None:
        sent = await message.answer(text, **kwargs)
    else:
        try:
            sent = await message.edit_text(text, **kwargs)
        except Exception as e:
            logging.debug(f"Edit rejected for node {node_id}, sending a new message: {e}")
            sent = await message.answer(text, **kwargs)
    await log_outgoing_message(message, text, node_id, reply_markup, acting_user)
    return sent"#;
