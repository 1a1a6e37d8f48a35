use crate::project::Position;
use serde::Deserialize;

/// Top-level project as the editor saves it.
///
/// Older editor versions saved a single sheet as bare `nodes`/`connections`;
/// both shapes are accepted.
#[derive(Debug, Deserialize, Default)]
pub struct EditorProject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sheets: Vec<EditorSheet>,
    #[serde(default, alias = "interSheetConnections")]
    pub inter_sheet_connections: Vec<EditorConnection>,
    #[serde(default, alias = "activeSheetId")]
    pub active_sheet_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<EditorNode>,
    #[serde(default)]
    pub connections: Vec<EditorConnection>,
    #[serde(default, alias = "connectedGroups")]
    pub groups: Vec<EditorGroup>,
}

#[derive(Debug, Deserialize)]
pub struct EditorSheet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<EditorNode>,
    #[serde(default)]
    pub connections: Vec<EditorConnection>,
}

/// A loosely typed node: a `type` string plus a grab-bag `data` object.
#[derive(Debug, Deserialize)]
pub struct EditorNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: EditorNodeData,
}

#[derive(Debug, Deserialize, Default)]
pub struct EditorNodeData {
    pub command: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "messageText")]
    pub text: String,
    #[serde(default)]
    pub markdown: bool,
    #[serde(alias = "keyboardType")]
    pub keyboard_type: Option<String>,
    #[serde(default)]
    pub buttons: Vec<EditorButton>,
    #[serde(default, alias = "oneTimeKeyboard")]
    pub one_time_keyboard: bool,
    #[serde(default, alias = "resizeKeyboard")]
    pub resize_keyboard: bool,
    #[serde(default, alias = "showInMenu")]
    pub show_in_menu: bool,
    #[serde(default, alias = "adminOnly")]
    pub admin_only: bool,
    #[serde(default, alias = "isPrivateOnly")]
    pub is_private_only: bool,
    #[serde(default, alias = "requiresAuth")]
    pub requires_auth: bool,
    #[serde(default, alias = "attachedMedia")]
    pub attached_media: Vec<EditorAttachedMedia>,
    #[serde(alias = "mediaType")]
    pub media_type: Option<String>,
    #[serde(alias = "mediaUrl")]
    pub media_url: Option<String>,
    #[serde(alias = "inputVariable")]
    pub input_variable: Option<String>,
    #[serde(alias = "inputTargetNodeId")]
    pub input_target_node_id: Option<String>,
    #[serde(alias = "autoTransitionTo")]
    pub auto_transition_to: Option<String>,
    #[serde(default, alias = "collectUserInput")]
    pub collect_user_input: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditorButton {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default = "default_action")]
    pub action: String,
    pub target: Option<String>,
    pub url: Option<String>,
    #[serde(alias = "requestContact")]
    pub request_contact: Option<bool>,
    #[serde(alias = "requestLocation")]
    pub request_location: Option<bool>,
}

fn default_action() -> String {
    "goto".to_string()
}

/// Either a bare variable name or a `{ variable, type }` record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EditorAttachedMedia {
    Variable(String),
    Typed {
        variable: String,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct EditorConnection {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "isInterSheet")]
    pub is_inter_sheet: bool,
    #[serde(alias = "sourceSheetId")]
    pub source_sheet_id: Option<String>,
    #[serde(alias = "targetSheetId")]
    pub target_sheet_id: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditorGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "isAdmin")]
    pub is_admin: bool,
    #[serde(alias = "chatType")]
    pub chat_type: Option<String>,
    #[serde(default, alias = "adminRights")]
    pub rights: Vec<String>,
    #[serde(default)]
    pub description: String,
}
