use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::{SourceWriter, py_str};
use itertools::Itertools;

/// Emits the menu registration, `main()` and the `__main__` guard.
pub struct EntryGenerator;

impl FragmentGenerator for EntryGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Entry
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        let mut provides = vec!["main".to_string()];
        let mut requires = vec!["bot".to_string(), "dp".to_string()];

        if ctx.flags.needs_menu {
            let entries: Vec<(&str, &str)> = ctx
                .project
                .nodes()
                .filter_map(|(_, node)| node.kind.command())
                .filter(|cmd| cmd.show_in_menu)
                .map(|cmd| (cmd.name(), cmd.description.as_str()))
                .unique_by(|(name, _)| *name)
                .collect();

            w.block("async def set_bot_commands():", |w| {
                w.line("commands = [");
                w.indent();
                for (name, description) in &entries {
                    let description = if description.trim().is_empty() {
                        name
                    } else {
                        description
                    };
                    w.line(format!(
                        "BotCommand(command={}, description={}),",
                        py_str(name),
                        py_str(description)
                    ));
                }
                w.dedent();
                w.line("]");
                w.line("await bot.set_my_commands(commands)");
            });
            w.blank();
            w.blank();
            provides.push("set_bot_commands".to_string());
        }

        w.block("async def main():", |w| {
            if ctx.flags.needs_persistence {
                w.line("await init_database()");
                requires.extend(["init_database".to_string(), "db_pool".to_string()]);
            }
            if ctx.flags.needs_menu {
                w.block("try:", |w| {
                    w.line("await set_bot_commands()");
                });
                w.block("except Exception as e:", |w| {
                    w.line("logging.error(f\"Could not register the command menu: {e}\")");
                });
            }
            w.line(format!(
                "logging.info({})",
                py_str(&format!("Starting {}", ctx.display_name))
            ));
            w.block("try:", |w| {
                w.line("await dp.start_polling(bot)");
            });
            w.block("finally:", |w| {
                if ctx.flags.needs_persistence {
                    w.block("if db_pool is not None:", |w| {
                        w.line("await db_pool.close()");
                    });
                }
                w.line("await bot.session.close()");
            });
        });
        w.blank();
        w.blank();
        w.block("if __name__ == \"__main__\":", |w| {
            w.line("asyncio.run(main())");
        });

        Fragment::new(self.kind(), w.finish())
            .providing(provides)
            .requiring(requires)
    }
}
