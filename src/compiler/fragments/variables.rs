use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::{SourceWriter, py_str};
use crate::runtime::BUILTIN_VARIABLES;

/// Emits the variable runtime every message-rendering branch relies on.
///
/// Resolution is three-tier: absent, then durable values, then local values
/// overlaid on top. Local wins on conflict.
pub struct VariableGenerator;

impl FragmentGenerator for VariableGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Variables
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        w.snippet(ACTING_USER);
        w.blank();
        w.blank();
        w.block("def init_user_variables(user) -> dict:", |w| {
            w.line("\"\"\"Create the local variable record for a user on first contact.\"\"\"");
            w.block("if user.id not in user_data:", |w| {
                w.line("user_data[user.id] = {");
                w.indent();
                for (name, expr) in builtin_expressions() {
                    w.line(format!("{}: {},", py_str(name), expr));
                }
                w.dedent();
                w.line("}");
            });
            w.line("return user_data[user.id]");
        });
        w.blank();
        w.blank();
        w.block("async def get_user_variables(user) -> dict:", |w| {
            w.line("\"\"\"Merge the variable tiers for a user: durable first, local on top.\"\"\"");
            w.line("variables = {}");
            if ctx.flags.needs_persistence {
                w.line("db_user = await get_user_from_db(user.id)");
                w.block("if db_user is not None:", |w| {
                    w.line("variables.update(decode_user_data(db_user.get(\"user_data\")))");
                });
            }
            w.line("variables.update(init_user_variables(user))");
            w.line("return variables");
        });
        w.blank();
        w.blank();
        w.snippet(SUBSTITUTION);

        let mut requires = vec!["user_data"];
        if ctx.flags.needs_persistence {
            requires.extend(["get_user_from_db", "decode_user_data"]);
        }
        Fragment::new(self.kind(), w.finish())
            .providing([
                "get_acting_user",
                "init_user_variables",
                "get_user_variables",
                "replace_variables_in_text",
                "render_text",
            ])
            .requiring(requires)
    }
}

/// Python expressions seeding each built-in variable from an aiogram `User`.
fn builtin_expressions() -> impl Iterator<Item = (&'static str, &'static str)> {
    BUILTIN_VARIABLES.iter().map(|name| {
        let expr = match *name {
            "user_id" => "user.id",
            "user_name" => "user.first_name or user.username or str(user.id)",
            "first_name" => "user.first_name or \"\"",
            "last_name" => "user.last_name or \"\"",
            "username" => "user.username or \"\"",
            _ => "None",
        };
        (*name, expr)
    })
}

const ACTING_USER: &str = r#"def get_acting_user(message=None, callback_query=None):
    """Return the user behind whichever update context is present."""
    if callback_query is not None and getattr(callback_query, "from_user", None) is not None:
        return callback_query.from_user
    if message is not None and getattr(message, "from_user", None) is not None:
        return message.from_user
    return None"#;

const SUBSTITUTION: &str = r#"def replace_variables_in_text(text: str, variables: dict) -> str:
    """Replace {name} placeholders with values from the merged variable table."""
    if not text:
        return text
    for name, value in variables.items():
        placeholder = "{" + str(name) + "}"
        if placeholder in text:
            text = text.replace(placeholder, str(value))
    return text


async def render_text(text: str, message=None, callback_query=None, acting_user=None) -> str:
    """Substitute variables for the acting user, leaving the text untouched without one."""
    user = acting_user or get_acting_user(message, callback_query)
    if user is None:
        return text
    variables = await get_user_variables(user)
    return replace_variables_in_text(text, variables)"#;
