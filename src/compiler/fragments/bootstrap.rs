use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::SourceWriter;
use itertools::Itertools;

/// Placeholder written in place of the real bot token.
pub const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";

pub struct BootstrapGenerator;

impl FragmentGenerator for BootstrapGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Bootstrap
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        w.line("# Replace the placeholder with your token from @BotFather,");
        w.line("# or set BOT_TOKEN in the environment or the .env file.");
        w.line(format!(
            "BOT_TOKEN = os.getenv(\"BOT_TOKEN\", \"{}\")",
            TOKEN_PLACEHOLDER
        ));
        w.blank();
        w.block("logging.basicConfig(", |w| {
            w.line("level=logging.INFO,");
            w.line("format=\"%(asctime)s - %(name)s - %(levelname)s - %(message)s\",");
        });
        w.line(")");
        w.blank();
        w.line(format!(
            "ADMIN_IDS = [{}]",
            ctx.settings.admin_ids.iter().join(", ")
        ));
        w.blank();
        w.line("bot = Bot(token=BOT_TOKEN)");
        w.line("dp = Dispatcher()");
        w.blank();
        w.line("# Local variable tier: user id -> variables collected in this process.");
        w.line("user_data = {}");

        Fragment::new(self.kind(), w.finish())
            .providing(["BOT_TOKEN", "ADMIN_IDS", "bot", "dp", "user_data"])
    }
}
