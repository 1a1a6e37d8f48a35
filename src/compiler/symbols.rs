//! Turns user-entered ids and command names into safe Python identifiers.
//!
//! Every handler name and cross-reference in the emitted program is obtained
//! from one [`SymbolTable`], so definition sites and call sites always agree.

use crate::project::{ButtonAction, KeyboardKind, NodeRef, Project, command_name};
use ahash::{AHashMap, AHashSet};
use std::hash::Hash;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Maps an arbitrary string onto a legal Python identifier.
///
/// This alone is not injective; [`SymbolTable`] adds collision suffixes.
pub fn sanitize(raw: &str) -> String {
    let mut ident: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert_str(0, "n_");
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Top-level names the fixed parts of the emitted program define or import.
/// Derived handler names never take one of these.
const RESERVED_NAMES: &[&str] = &[
    "ADMIN_IDS", "AutoTransitionContext", "BOT_TOKEN", "Bot", "BotCommand", "CONNECTED_GROUPS",
    "Command", "DATABASE_URL", "Dispatcher", "F", "InlineKeyboardBuilder",
    "InlineKeyboardButton", "KeyboardButton", "NODE_SHEETS", "ParseMode",
    "ReplyKeyboardBuilder", "asyncio", "asyncpg", "bot", "check_auth",
    "collect_keyboard_buttons", "dataclass", "db_pool", "decode_user_data", "dp",
    "get_acting_user", "get_user_field_from_db", "get_user_from_db", "get_user_variables",
    "handle_unrouted_callback", "handle_user_input", "init_database", "init_user_variables",
    "is_admin", "is_private_chat", "json", "load_dotenv", "log_outgoing_message", "logging",
    "main", "navigate_to_node", "os", "pending_inputs", "render_text",
    "replace_variables_in_text", "safe_edit_or_send", "save_message_to_db", "save_user_to_db",
    "set_bot_commands", "types", "update_user_field_in_db", "user_data",
];

/// One injective key -> identifier mapping.
#[derive(Debug)]
struct Namespace<K> {
    assigned: AHashMap<K, String>,
    taken: AHashSet<String>,
}

impl<K: Hash + Eq> Namespace<K> {
    fn new() -> Self {
        Self {
            assigned: AHashMap::new(),
            taken: AHashSet::new(),
        }
    }

    /// Returns the identifier for `key`, assigning one on first sight.
    fn intern(&mut self, key: K, raw: &str) -> &str {
        let taken = &mut self.taken;
        self.assigned.entry(key).or_insert_with(|| {
            let base = sanitize(raw);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while taken.contains(&candidate) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
    }

    fn reserve(&mut self, names: &[&str]) {
        self.taken.extend(names.iter().map(|n| n.to_string()));
    }

    fn get(&self, key: &K) -> Option<&str> {
        self.assigned.get(key).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.assigned.len()
    }
}

/// Every kind of generated handler function. All of them share one namespace,
/// so no two definitions in the emitted program can bind the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Handler {
    Command(String),
    CommandAlias(String),
    Callback(NodeRef),
    Reply(NodeRef, usize),
    CommandButton(String),
}

/// The single authority for identifiers in one compile.
#[derive(Debug)]
pub struct SymbolTable {
    nodes: Namespace<NodeRef>,
    commands: Namespace<String>,
    handlers: Namespace<Handler>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        let mut handlers = Namespace::new();
        handlers.reserve(RESERVED_NAMES);
        Self {
            nodes: Namespace::new(),
            commands: Namespace::new(),
            handlers,
        }
    }
}

impl SymbolTable {
    /// Interns every node and command of `project` in first-seen order:
    /// sheets in order, nodes in order within each sheet.
    ///
    /// Reply-route and command-button handlers are interned after every node
    /// and command.
    pub fn build(project: &Project) -> Self {
        let mut table = Self::default();
        for (sheet, node) in project.nodes() {
            table.intern_node(NodeRef::new(&sheet.id, &node.id));
            if let Some(cmd) = node.kind.command() {
                table.intern_command(cmd.name());
            }
        }
        for (sheet, node) in project.nodes() {
            let keyboard = &node.kind.message().keyboard;
            for (index, button) in keyboard.buttons.iter().enumerate() {
                match (&keyboard.kind, &button.action) {
                    (KeyboardKind::Reply, _) => {
                        let node_ref = NodeRef::new(&sheet.id, &node.id);
                        let raw = format!("handle_reply_{}_{}", table.node(&node_ref), index);
                        table.handlers.intern(Handler::Reply(node_ref, index), &raw);
                    }
                    (KeyboardKind::Inline, ButtonAction::Command { command }) => {
                        let name = command_name(command);
                        let raw = format!(
                            "handle_cmd_button_{}",
                            table.commands.get(&name.to_string()).unwrap_or(name)
                        );
                        table
                            .handlers
                            .intern(Handler::CommandButton(name.to_string()), &raw);
                    }
                    _ => {}
                }
            }
        }
        table
    }

    /// Interns a node and its callback handler.
    pub fn intern_node(&mut self, node_ref: NodeRef) -> &str {
        let raw = node_ref.node.clone();
        let symbol = self.nodes.intern(node_ref.clone(), &raw).to_string();
        self.handlers.intern(
            Handler::Callback(node_ref.clone()),
            &format!("handle_callback_{}", symbol),
        );
        self.node(&node_ref)
    }

    /// Interns a command, its handler and its persistence alias.
    pub fn intern_command(&mut self, command: &str) -> &str {
        let symbol = self.commands.intern(command.to_string(), command).to_string();
        self.handlers.intern(
            Handler::Command(command.to_string()),
            &format!("{}_handler", symbol),
        );
        self.handlers.intern(
            Handler::CommandAlias(command.to_string()),
            &format!("handle_command_{}", symbol),
        );
        self.command(command)
    }

    fn handler(&self, key: &Handler) -> String {
        self.handlers
            .get(key)
            .unwrap_or("unresolved_handler")
            .to_string()
    }

    /// The identifier for a node; it doubles as the node's callback data.
    pub fn node(&self, node_ref: &NodeRef) -> &str {
        self.nodes.get(node_ref).unwrap_or("unresolved_node")
    }

    pub fn command(&self, command: &str) -> &str {
        self.commands
            .get(&command.to_string())
            .unwrap_or("unresolved_command")
    }

    pub fn callback_handler(&self, node_ref: &NodeRef) -> String {
        self.handler(&Handler::Callback(node_ref.clone()))
    }

    pub fn reply_handler(&self, node_ref: &NodeRef, button_index: usize) -> String {
        self.handler(&Handler::Reply(node_ref.clone(), button_index))
    }

    pub fn command_handler(&self, command: &str) -> String {
        self.handler(&Handler::Command(command.to_string()))
    }

    /// Alias emitted by the persistence layer so callbacks can run a command directly.
    pub fn command_alias(&self, command: &str) -> String {
        self.handler(&Handler::CommandAlias(command.to_string()))
    }

    /// Handler of the inline `cmd:<name>` callback, whether or not a node defines the command.
    pub fn command_button_handler(&self, command: &str) -> String {
        self.handler(&Handler::CommandButton(command.to_string()))
    }

    /// Callback data of an inline button that runs a command. The colon keeps it
    /// disjoint from node callback data, which is always a bare identifier.
    pub fn command_callback_data(&self, command: &str) -> String {
        format!("cmd:{}", command)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize("node-1"), "node_1");
        assert_eq!(sanitize("hello world!"), "hello_world_");
        assert_eq!(sanitize("42"), "n_42");
        assert_eq!(sanitize(""), "n_");
        assert_eq!(sanitize("class"), "class_");
        assert_eq!(sanitize("привет"), "______");
    }

    #[test]
    fn colliding_ids_get_suffixes_in_first_seen_order() {
        let mut table = SymbolTable::default();
        let a = table.intern_node(NodeRef::new("main", "node-1")).to_string();
        let b = table.intern_node(NodeRef::new("main", "node_1")).to_string();
        let c = table.intern_node(NodeRef::new("main", "node 1")).to_string();
        assert_eq!(a, "node_1");
        assert_eq!(b, "node_1_2");
        assert_eq!(c, "node_1_3");
    }

    #[test]
    fn suffix_skips_identifiers_already_taken() {
        let mut table = SymbolTable::default();
        table.intern_node(NodeRef::new("main", "a_2"));
        table.intern_node(NodeRef::new("main", "a"));
        let clash = table.intern_node(NodeRef::new("main", "a-")).to_string();
        // "a-" sanitizes to "a_", which is free.
        assert_eq!(clash, "a_");
        let second = table.intern_node(NodeRef::new("main", "a!")).to_string();
        assert_eq!(second, "a__2");
        let third = table.intern_node(NodeRef::new("other", "a")).to_string();
        assert_eq!(third, "a_3");
    }

    #[test]
    fn same_id_on_two_sheets_is_qualified() {
        let mut table = SymbolTable::default();
        let first = table.intern_node(NodeRef::new("sheet1", "menu")).to_string();
        let second = table.intern_node(NodeRef::new("sheet2", "menu")).to_string();
        assert_eq!(first, "menu");
        assert_eq!(second, "menu_2");
        assert_eq!(table.node(&NodeRef::new("sheet1", "menu")), "menu");
    }

    #[test]
    fn interning_is_stable() {
        let mut table = SymbolTable::default();
        let first = table.intern_command("my-cmd").to_string();
        let again = table.intern_command("my-cmd").to_string();
        assert_eq!(first, again);
        assert_eq!(table.command_count(), 1);
        assert_eq!(table.command_handler("my-cmd"), "my_cmd_handler");
        assert_eq!(table.command_alias("my-cmd"), "handle_command_my_cmd");
    }

    #[test]
    fn command_and_callback_handlers_never_share_a_name() {
        let mut table = SymbolTable::default();
        let command = "handle_callback_menu";
        table.intern_command(command);
        let menu = NodeRef::new("main", "menu_handler");
        table.intern_node(menu.clone());
        assert_eq!(table.command_handler(command), "handle_callback_menu_handler");
        assert_eq!(table.callback_handler(&menu), "handle_callback_menu_handler_2");
    }

    #[test]
    fn command_buttons_get_handlers_for_undefined_commands() {
        use crate::project::{Button, CommandPayload, Node, NodeKind, Sheet};

        let mut node = Node {
            id: "S".to_string(),
            position: Default::default(),
            kind: NodeKind::Start(CommandPayload {
                command: "/start".to_string(),
                ..Default::default()
            }),
        };
        if let NodeKind::Start(cmd) = &mut node.kind {
            cmd.reply.keyboard.kind = KeyboardKind::Inline;
            cmd.reply.keyboard.buttons = ["/start", "/ghost"]
                .iter()
                .map(|c| Button {
                    id: c.to_string(),
                    text: c.to_string(),
                    action: ButtonAction::Command {
                        command: c.to_string(),
                    },
                })
                .collect();
        }
        let project = Project {
            sheets: vec![Sheet {
                id: "main".to_string(),
                name: "main".to_string(),
                nodes: vec![node],
                connections: vec![],
            }],
            ..Default::default()
        };
        let table = SymbolTable::build(&project);
        assert_eq!(table.command_button_handler("start"), "handle_cmd_button_start");
        assert_eq!(table.command_button_handler("ghost"), "handle_cmd_button_ghost");
    }

    fn is_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !PYTHON_KEYWORDS.contains(&s)
    }

    proptest! {
        #[test]
        fn sanitize_always_yields_identifier(raw in ".{0,24}") {
            prop_assert!(is_identifier(&sanitize(&raw)));
        }

        #[test]
        fn node_symbols_are_pairwise_distinct(ids in prop::collection::vec("[a-c _-]{0,3}", 1..24)) {
            let mut table = SymbolTable::default();
            let mut seen = AHashSet::new();
            for (i, id) in ids.iter().enumerate() {
                // Distinct keys even when raw ids repeat.
                let symbol = table.intern_node(NodeRef::new(format!("s{}", i), id.clone())).to_string();
                prop_assert!(is_identifier(&symbol));
                prop_assert!(seen.insert(symbol));
            }
        }

        #[test]
        fn handler_names_are_pairwise_distinct(
            ids in prop::collection::vec(
                ("[a-c_]{0,3}", prop::sample::select(vec![
                    "", "_handler", "handle_callback_", "handle_command_", "menu",
                ]), any::<bool>()),
                1..24,
            )
        ) {
            let mut table = SymbolTable::default();
            let mut nodes = Vec::new();
            let mut commands = Vec::new();
            for (i, (stem, affix, is_command)) in ids.iter().enumerate() {
                let raw = if affix.starts_with('_') {
                    format!("{}{}", stem, affix)
                } else {
                    format!("{}{}", affix, stem)
                };
                if *is_command {
                    table.intern_command(&raw);
                    commands.push(raw);
                } else {
                    let node_ref = NodeRef::new(format!("s{}", i), raw);
                    table.intern_node(node_ref.clone());
                    nodes.push(node_ref);
                }
            }
            commands.sort();
            commands.dedup();

            let names: Vec<String> = nodes
                .iter()
                .map(|n| table.callback_handler(n))
                .chain(commands.iter().map(|c| table.command_handler(c)))
                .chain(commands.iter().map(|c| table.command_alias(c)))
                .collect();
            let mut seen = AHashSet::new();
            for name in names {
                prop_assert!(is_identifier(&name), "{} is not an identifier", name);
                prop_assert!(!RESERVED_NAMES.contains(&name.as_str()));
                prop_assert!(seen.insert(name.clone()), "{} defined twice", name);
            }
        }
    }
}
