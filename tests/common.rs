//! Common test utilities for building project graphs.
use botflow::prelude::*;

/// A start node answering `/start` with `text`.
#[allow(dead_code)]
pub fn start_node(id: &str, text: &str) -> Node {
    command_node(id, "/start", text)
}

#[allow(dead_code)]
pub fn command_node(id: &str, command: &str, text: &str) -> Node {
    let payload = CommandPayload {
        command: command.to_string(),
        description: String::new(),
        reply: MessagePayload {
            text: text.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    Node {
        id: id.to_string(),
        position: Position::default(),
        kind: if command.trim_start_matches('/') == "start" {
            NodeKind::Start(payload)
        } else {
            NodeKind::Command(payload)
        },
    }
}

#[allow(dead_code)]
pub fn message_node(id: &str, text: &str) -> Node {
    Node {
        id: id.to_string(),
        position: Position::default(),
        kind: NodeKind::Message(MessagePayload {
            text: text.to_string(),
            ..Default::default()
        }),
    }
}

#[allow(dead_code)]
pub fn input_node(id: &str, prompt: &str, variable: &str, next: Option<&str>) -> Node {
    Node {
        id: id.to_string(),
        position: Position::default(),
        kind: NodeKind::Input(InputPayload {
            prompt: MessagePayload {
                text: prompt.to_string(),
                ..Default::default()
            },
            variable: variable.to_string(),
            next: next.map(str::to_string),
        }),
    }
}

/// Gives `node` an inline keyboard of goto buttons, one per `(label, target)`.
#[allow(dead_code)]
pub fn with_inline_buttons(mut node: Node, buttons: &[(&str, &str)]) -> Node {
    let keyboard = &mut message_mut(&mut node).keyboard;
    keyboard.kind = KeyboardKind::Inline;
    keyboard.buttons = buttons
        .iter()
        .enumerate()
        .map(|(i, (label, target))| Button {
            id: format!("b{}", i),
            text: label.to_string(),
            action: ButtonAction::Goto {
                target: target.to_string(),
            },
        })
        .collect();
    node
}

#[allow(dead_code)]
pub fn with_auto_transition(mut node: Node, target: &str, collect_user_input: bool) -> Node {
    let message = message_mut(&mut node);
    message.auto_transition_to = Some(target.to_string());
    message.collect_user_input = collect_user_input;
    node
}

#[allow(dead_code)]
pub fn message_mut(node: &mut Node) -> &mut MessagePayload {
    match &mut node.kind {
        NodeKind::Start(cmd) | NodeKind::Command(cmd) => &mut cmd.reply,
        NodeKind::Message(msg) => msg,
        NodeKind::Media(media) => &mut media.caption,
        NodeKind::Input(input) => &mut input.prompt,
    }
}

#[allow(dead_code)]
pub fn connection(source: &str, target: &str) -> Connection {
    Connection {
        source: source.to_string(),
        target: target.to_string(),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn sheet(id: &str, nodes: Vec<Node>, connections: Vec<Connection>) -> Sheet {
    Sheet {
        id: id.to_string(),
        name: id.to_string(),
        nodes,
        connections,
    }
}

/// A project made of a single sheet called `main`.
#[allow(dead_code)]
pub fn single_sheet(nodes: Vec<Node>, connections: Vec<Connection>) -> Project {
    Project {
        name: "Test bot".to_string(),
        sheets: vec![sheet("main", nodes, connections)],
        ..Default::default()
    }
}

/// `/start` -> `M` through a plain connection; `M` has no keyboard or media.
#[allow(dead_code)]
pub fn create_minimal_project() -> Project {
    single_sheet(
        vec![start_node("S", "Hi"), message_node("M", "Hello {user_name}")],
        vec![connection("S", "M")],
    )
}

/// A start node with an inline menu, an input prompt and a thank-you page.
#[allow(dead_code)]
pub fn create_menu_project() -> Project {
    single_sheet(
        vec![
            with_inline_buttons(
                start_node("start", "Hi {user_name}!"),
                &[("Sign up", "ask_name"), ("About", "about")],
            ),
            input_node("ask_name", "What is your name?", "name", Some("thanks")),
            message_node("thanks", "Thanks, {name}!"),
            message_node("about", "We make bots."),
        ],
        vec![],
    )
}

#[allow(dead_code)]
pub fn compile(project: Project, settings: ProjectSettings) -> CompilationArtifact {
    Compiler::builder(project, settings)
        .build()
        .compile()
        .expect("Failed to compile project")
}

/// An editor export in the current multi-sheet shape.
#[allow(dead_code)]
pub const EDITOR_PROJECT_JSON: &str = r#"{
    "name": "Shop bot",
    "activeSheetId": "main",
    "sheets": [
        {
            "id": "main",
            "name": "Main",
            "nodes": [
                {
                    "id": "start",
                    "type": "start",
                    "position": { "x": 0, "y": 0 },
                    "data": {
                        "command": "/start",
                        "description": "Open the shop",
                        "showInMenu": true,
                        "messageText": "Welcome, {user_name}!",
                        "keyboardType": "inline",
                        "buttons": [
                            { "id": "b1", "text": "Catalog", "action": "goto", "target": "catalog" },
                            { "id": "b2", "text": "Site", "action": "url", "url": "https://example.com" }
                        ]
                    }
                }
            ],
            "connections": []
        },
        {
            "id": "shop",
            "name": "Shop",
            "nodes": [
                {
                    "id": "catalog",
                    "type": "message",
                    "position": { "x": 300, "y": 0 },
                    "data": { "text": "Our catalog" }
                }
            ],
            "connections": []
        }
    ],
    "interSheetConnections": [
        {
            "source": "start",
            "target": "catalog",
            "isInterSheet": true,
            "sourceSheetId": "main",
            "targetSheetId": "shop"
        }
    ]
}"#;

/// An editor export from before sheets existed.
#[allow(dead_code)]
pub const LEGACY_PROJECT_JSON: &str = r#"{
    "name": "Legacy bot",
    "nodes": [
        { "id": "s", "type": "start", "data": { "text": "Hello" } },
        { "id": "help", "type": "command", "data": { "command": "/help", "text": "Help text" } },
        { "id": "m", "type": "message", "data": { "text": "Bye" } }
    ],
    "connections": [ { "source": "s", "target": "m" } ]
}"#;
