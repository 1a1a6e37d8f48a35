use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::SourceWriter;

/// Emits `is_admin`, `is_private_chat` and `check_auth`.
///
/// `check_auth` has two call-compatible bodies chosen at compile time: with
/// persistence a user is authorized when their row exists in the durable store,
/// without it when they are present in the local tier.
pub struct PredicateGenerator;

impl FragmentGenerator for PredicateGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Predicates
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        w.block("def is_admin(user_id: int) -> bool:", |w| {
            w.line("return user_id in ADMIN_IDS");
        });
        w.blank();
        w.blank();
        w.block("def is_private_chat(message: types.Message) -> bool:", |w| {
            w.line("return message.chat.type == \"private\"");
        });
        w.blank();
        w.blank();
        w.block("async def check_auth(user_id: int) -> bool:", |w| {
            if ctx.flags.needs_persistence {
                w.block("if db_pool is None:", |w| {
                    w.line("logging.warning(\"check_auth: durable store unavailable, denying access\")");
                    w.line("return False");
                });
                w.line("user = await get_user_from_db(user_id)");
                w.line("return user is not None");
            } else {
                w.line("return user_id in user_data");
            }
        });

        let mut requires = vec!["ADMIN_IDS"];
        if ctx.flags.needs_persistence {
            requires.extend(["db_pool", "get_user_from_db"]);
        } else {
            requires.push("user_data");
        }
        Fragment::new(self.kind(), w.finish())
            .providing(["is_admin", "is_private_chat", "check_auth"])
            .requiring(requires)
    }
}
