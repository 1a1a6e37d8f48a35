use serde::{Deserialize, Serialize};

/// The complete, canonical definition of a bot project, ready for compilation.
/// This is the target structure for any editor format conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub sheets: Vec<Sheet>,
    #[serde(default)]
    pub inter_sheet_connections: Vec<Connection>,
    #[serde(default)]
    pub active_sheet: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl Project {
    /// Iterates every node together with the sheet that owns it, in sheet order.
    pub fn nodes(&self) -> impl Iterator<Item = (&Sheet, &Node)> {
        self.sheets
            .iter()
            .flat_map(|sheet| sheet.nodes.iter().map(move |node| (sheet, node)))
    }

    /// Iterates every connection, sheet-local ones first, then inter-sheet ones.
    pub fn connections(&self) -> impl Iterator<Item = (Option<&Sheet>, &Connection)> {
        self.sheets
            .iter()
            .flat_map(|sheet| sheet.connections.iter().map(move |c| (Some(sheet), c)))
            .chain(self.inter_sheet_connections.iter().map(|c| (None, c)))
    }

    pub fn sheet(&self, id: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    pub fn node(&self, node_ref: &NodeRef) -> Option<&Node> {
        self.sheet(&node_ref.sheet)?.node(&node_ref.node)
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.iter().all(|s| s.nodes.is_empty())
    }
}

/// An independently addressable page of nodes and connections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub id: String,
    pub name: String,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Sheet {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A sheet-qualified node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub sheet: String,
    pub node: String,
}

impl NodeRef {
    pub fn new(sheet: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            node: node.into(),
        }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.sheet, self.node)
    }
}

/// Canvas position. Never used by compilation, kept for round-trip fidelity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One unit of bot behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    pub kind: NodeKind,
}

/// The closed set of node variants, one payload shape per variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodeKind {
    Start(CommandPayload),
    Command(CommandPayload),
    Message(MessagePayload),
    Media(MediaPayload),
    Input(InputPayload),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Start(_) => "start",
            NodeKind::Command(_) => "command",
            NodeKind::Message(_) => "message",
            NodeKind::Media(_) => "media",
            NodeKind::Input(_) => "input",
        }
    }

    pub fn command(&self) -> Option<&CommandPayload> {
        match self {
            NodeKind::Start(cmd) | NodeKind::Command(cmd) => Some(cmd),
            NodeKind::Message(_) | NodeKind::Media(_) | NodeKind::Input(_) => None,
        }
    }

    /// The message every variant renders when it is reached.
    pub fn message(&self) -> &MessagePayload {
        match self {
            NodeKind::Start(cmd) | NodeKind::Command(cmd) => &cmd.reply,
            NodeKind::Message(msg) => msg,
            NodeKind::Media(media) => &media.caption,
            NodeKind::Input(input) => &input.prompt,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandPayload {
    /// Command string, with or without the leading slash.
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub show_in_menu: bool,
    #[serde(default)]
    pub admin_only: bool,
    #[serde(default)]
    pub private_only: bool,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(default)]
    pub reply: MessagePayload,
}

impl CommandPayload {
    /// The command name as registered with the dispatcher, without the slash.
    pub fn name(&self) -> &str {
        command_name(&self.command)
    }
}

/// Strips whitespace and the leading slash from a command string.
pub fn command_name(raw: &str) -> &str {
    raw.trim().trim_start_matches('/')
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Message text; may contain `{variable}` placeholders.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub markdown: bool,
    #[serde(default)]
    pub keyboard: Keyboard,
    #[serde(default)]
    pub attached_media: Vec<AttachedMedia>,
    #[serde(default)]
    pub auto_transition_to: Option<String>,
    #[serde(default)]
    pub collect_user_input: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyboard {
    #[serde(default)]
    pub kind: KeyboardKind,
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(default)]
    pub one_time: bool,
    #[serde(default)]
    pub resize: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardKind {
    #[default]
    None,
    Reply,
    Inline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub text: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ButtonAction {
    Goto { target: String },
    Url { url: String },
    Command { command: String },
    RequestContact,
    RequestLocation,
}

/// A media reference resolved at runtime from a user variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedMedia {
    pub variable: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Photo,
    Video,
    Audio,
    Document,
    Animation,
}

impl MediaKind {
    /// The aiogram `Bot` method that sends this kind of media.
    pub fn send_method(self) -> &'static str {
        match self {
            MediaKind::Photo => "send_photo",
            MediaKind::Video => "send_video",
            MediaKind::Audio => "send_audio",
            MediaKind::Document => "send_document",
            MediaKind::Animation => "send_animation",
        }
    }

    /// The keyword argument carrying the media payload for `send_method`.
    pub fn argument(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
            MediaKind::Animation => "animation",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "photo" | "image" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            "document" | "file" => Some(MediaKind::Document),
            "animation" | "gif" => Some(MediaKind::Animation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaPayload {
    pub media_kind: MediaKind,
    /// URL or file id of the media.
    pub source: String,
    #[serde(default)]
    pub caption: MessagePayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputPayload {
    #[serde(default)]
    pub prompt: MessagePayload,
    /// Name of the variable the answer is stored under.
    pub variable: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// A directed transition between two nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub inter_sheet: bool,
    /// Sheet of `source`; required when `inter_sheet` is set.
    #[serde(default)]
    pub source_sheet: Option<String>,
    /// Sheet of `target`; required when `inter_sheet` is set.
    #[serde(default)]
    pub target_sheet: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Metadata of a channel or group the bot is connected to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_chat_type")]
    pub chat_type: String,
    #[serde(default)]
    pub rights: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn default_chat_type() -> String {
    "group".to_string()
}
