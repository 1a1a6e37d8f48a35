//! The editor's JSON format and its conversion into a [`Project`].

mod types;

pub use types::*;

use crate::error::{CompileError, ProjectConversionError};
use crate::project::{
    AttachedMedia, Button, ButtonAction, CommandPayload, Connection, GroupConfig, InputPayload,
    IntoProject, Keyboard, KeyboardKind, MediaKind, MediaPayload, MessagePayload, Node, NodeKind,
    Project, Sheet,
};
use ahash::AHashSet;
use log::{debug, warn};

/// Id given to the sheet of a legacy single-sheet project.
pub const DEFAULT_SHEET_ID: &str = "main";

/// Parses editor JSON and converts it into a project graph.
pub fn load_project(json: &str) -> Result<Project, CompileError> {
    let editor: EditorProject =
        serde_json::from_str(json).map_err(|e| CompileError::JsonParseError(e.to_string()))?;
    Ok(editor.into_project()?)
}

impl IntoProject for EditorProject {
    fn into_project(self) -> Result<Project, ProjectConversionError> {
        let mut sheets = self.sheets;
        if sheets.is_empty() && (!self.nodes.is_empty() || !self.connections.is_empty()) {
            debug!("Converting legacy single-sheet project");
            sheets.push(EditorSheet {
                id: DEFAULT_SHEET_ID.to_string(),
                name: if self.name.is_empty() {
                    "Main".to_string()
                } else {
                    self.name.clone()
                },
                nodes: self.nodes,
                connections: self.connections,
            });
        }

        let mut sheet_ids = AHashSet::new();
        for sheet in &sheets {
            if !sheet_ids.insert(sheet.id.as_str()) {
                return Err(ProjectConversionError::ValidationError(format!(
                    "sheet id '{}' appears more than once",
                    sheet.id
                )));
            }
        }

        let sheets = sheets
            .into_iter()
            .map(convert_sheet)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Project {
            name: self.name,
            sheets,
            inter_sheet_connections: self
                .inter_sheet_connections
                .into_iter()
                .map(convert_connection)
                .collect(),
            active_sheet: self.active_sheet_id,
            groups: self.groups.into_iter().map(convert_group).collect(),
        })
    }
}

fn convert_sheet(sheet: EditorSheet) -> Result<Sheet, ProjectConversionError> {
    let nodes = sheet
        .nodes
        .into_iter()
        .map(convert_node)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Sheet {
        name: if sheet.name.is_empty() {
            sheet.id.clone()
        } else {
            sheet.name
        },
        id: sheet.id,
        nodes,
        connections: sheet.connections.into_iter().map(convert_connection).collect(),
    })
}

fn convert_node(node: EditorNode) -> Result<Node, ProjectConversionError> {
    if node.id.trim().is_empty() {
        return Err(ProjectConversionError::ValidationError(format!(
            "a '{}' node has an empty id",
            node.node_type
        )));
    }
    let id = node.id;
    let data = node.data;
    let kind = match node.node_type.as_str() {
        "start" => {
            let command = data.command.clone().unwrap_or_else(|| "/start".to_string());
            NodeKind::Start(command_payload(&id, command, data))
        }
        "command" => {
            let command = data.command.clone().ok_or(ProjectConversionError::MissingField {
                node_id: id.clone(),
                field: "command",
            })?;
            NodeKind::Command(command_payload(&id, command, data))
        }
        "message" | "text" => NodeKind::Message(message_payload(&id, data)),
        "media" | "photo" | "video" | "audio" | "document" | "animation" => {
            let media_kind = match node.node_type.as_str() {
                "media" => data.media_type.as_deref().and_then(MediaKind::parse),
                other => MediaKind::parse(other),
            }
            .unwrap_or_default();
            let source = data.media_url.clone().ok_or(ProjectConversionError::MissingField {
                node_id: id.clone(),
                field: "mediaUrl",
            })?;
            NodeKind::Media(MediaPayload {
                media_kind,
                source,
                caption: message_payload(&id, data),
            })
        }
        "input" | "user-input" => {
            let variable = data
                .input_variable
                .clone()
                .ok_or(ProjectConversionError::MissingField {
                    node_id: id.clone(),
                    field: "inputVariable",
                })?;
            let next = data.input_target_node_id.clone();
            NodeKind::Input(InputPayload {
                prompt: message_payload(&id, data),
                variable,
                next,
            })
        }
        other => {
            return Err(ProjectConversionError::UnknownNodeType {
                node_id: id,
                type_name: other.to_string(),
            });
        }
    };

    Ok(Node {
        id,
        position: node.position,
        kind,
    })
}

fn command_payload(node_id: &str, command: String, data: EditorNodeData) -> CommandPayload {
    CommandPayload {
        command,
        description: data.description.clone(),
        show_in_menu: data.show_in_menu,
        admin_only: data.admin_only,
        private_only: data.is_private_only,
        auth_required: data.requires_auth,
        reply: message_payload(node_id, data),
    }
}

fn message_payload(node_id: &str, data: EditorNodeData) -> MessagePayload {
    let kind = match data.keyboard_type.as_deref() {
        Some("inline") => KeyboardKind::Inline,
        Some("reply") => KeyboardKind::Reply,
        Some("none") | None => KeyboardKind::None,
        Some(other) => {
            warn!(node = node_id, keyboard = other; "Unknown keyboard type, treating as none");
            KeyboardKind::None
        }
    };
    MessagePayload {
        text: data.text,
        markdown: data.markdown,
        keyboard: Keyboard {
            kind,
            buttons: data
                .buttons
                .into_iter()
                .filter_map(|b| convert_button(node_id, b))
                .collect(),
            one_time: data.one_time_keyboard,
            resize: data.resize_keyboard,
        },
        attached_media: data.attached_media.into_iter().map(convert_media).collect(),
        auto_transition_to: data.auto_transition_to.filter(|t| !t.trim().is_empty()),
        collect_user_input: data.collect_user_input,
    }
}

fn convert_button(node_id: &str, button: EditorButton) -> Option<Button> {
    let action = if button.request_contact == Some(true) {
        ButtonAction::RequestContact
    } else if button.request_location == Some(true) {
        ButtonAction::RequestLocation
    } else {
        match button.action.as_str() {
            "goto" => ButtonAction::Goto {
                target: button.target.unwrap_or_default(),
            },
            "url" => ButtonAction::Url {
                url: button.url.unwrap_or_default(),
            },
            "command" => ButtonAction::Command {
                command: button.target.unwrap_or_default(),
            },
            "contact" | "request_contact" => ButtonAction::RequestContact,
            "location" | "request_location" => ButtonAction::RequestLocation,
            other => {
                warn!(node = node_id, action = other; "Unknown button action, button dropped");
                return None;
            }
        }
    };
    Some(Button {
        id: button.id,
        text: button.text,
        action,
    })
}

fn convert_media(media: EditorAttachedMedia) -> AttachedMedia {
    match media {
        EditorAttachedMedia::Variable(variable) => AttachedMedia {
            variable,
            kind: MediaKind::Photo,
        },
        EditorAttachedMedia::Typed { variable, kind } => AttachedMedia {
            variable,
            kind: kind.as_deref().and_then(MediaKind::parse).unwrap_or_default(),
        },
    }
}

fn convert_connection(connection: EditorConnection) -> Connection {
    Connection {
        source: connection.source,
        target: connection.target,
        inter_sheet: connection.is_inter_sheet,
        source_sheet: connection.source_sheet_id,
        target_sheet: connection.target_sheet_id,
        label: connection.label,
    }
}

fn convert_group(group: EditorGroup) -> GroupConfig {
    GroupConfig {
        id: group.id,
        name: group.name,
        is_admin: group.is_admin,
        chat_type: group.chat_type.unwrap_or_else(|| "group".to_string()),
        rights: group.rights,
        description: group.description,
    }
}
