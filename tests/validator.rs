//! Tests for structural validation and cross-sheet reference resolution.
mod common;
use botflow::prelude::*;
use common::*;

fn validate(project: Project) -> ValidationReport {
    Compiler::builder(project, ProjectSettings::default())
        .build()
        .validate()
}

#[test]
fn test_valid_project_has_no_errors() {
    let report = validate(create_menu_project());
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[test]
fn test_every_defect_is_reported_once() {
    let button_node = with_inline_buttons(message_node("B", "Buttons"), &[("Lost", "nowhere")]);
    let project = single_sheet(
        vec![
            command_node("H1", "/help", "Help"),
            command_node("H2", "help", "Help again"),
            with_auto_transition(message_node("M", "First"), "ghost", true),
            message_node("M", "Second"),
            button_node,
            input_node("I", "Name?", "name", Some("void")),
        ],
        vec![connection("H1", "lost")],
    );

    let report = validate(project);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 7, "errors: {:#?}", report.errors);

    let expected = [
        "Project has no start command node",
        "Command '/help' is defined by 2 nodes: H1, H2",
        "Connection H1 -> lost: target node 'lost' not found on sheet 'main'",
        "Node 'M' auto-transitions to 'ghost', which does not exist",
        "Node id 'M' is used more than once on sheet 'main'",
        "Button 'Lost' on node 'B' points to 'nowhere', which does not exist",
        "Input node 'I' continues to 'void', which does not exist",
    ];
    for (actual, expected) in report.errors.iter().zip(expected) {
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_empty_project_lacks_start() {
    let report = validate(Project::default());
    assert_eq!(report.errors, vec!["Project has no start command node".to_string()]);
}

#[test]
fn test_sheet_local_connection_cannot_cross_sheets() {
    let project = Project {
        name: "Sheets".to_string(),
        sheets: vec![
            sheet("a", vec![start_node("S", "Hi")], vec![connection("S", "X")]),
            sheet("b", vec![message_node("X", "Elsewhere")], vec![]),
        ],
        ..Default::default()
    };
    let report = validate(project);
    assert_eq!(
        report.errors,
        vec!["Connection S -> X: target node 'X' not found on sheet 'a'".to_string()]
    );
}

#[test]
fn test_inter_sheet_connection_resolves_unique_target() {
    let mut crossing = connection("S", "X");
    crossing.inter_sheet = true;
    let project = Project {
        name: "Sheets".to_string(),
        sheets: vec![
            sheet("a", vec![start_node("S", "Hi")], vec![crossing]),
            sheet("b", vec![message_node("X", "Elsewhere")], vec![]),
        ],
        ..Default::default()
    };
    let compiler = Compiler::builder(project, ProjectSettings::default()).build();
    assert!(compiler.validate().valid);
    assert!(compiler.feature_flags().needs_inter_sheet);
}

#[test]
fn test_button_target_on_two_other_sheets_is_ambiguous() {
    let start = with_inline_buttons(start_node("S", "Hi"), &[("Go", "X")]);
    let project = Project {
        name: "Sheets".to_string(),
        sheets: vec![
            sheet("a", vec![start], vec![]),
            sheet("b", vec![message_node("X", "B")], vec![]),
            sheet("c", vec![message_node("X", "C")], vec![]),
        ],
        ..Default::default()
    };
    let report = validate(project);
    assert_eq!(
        report.errors,
        vec!["Button 'Go' on node 'S' points to 'X', which matches 2 nodes on other sheets".to_string()]
    );
}

#[test]
fn test_local_node_shadows_other_sheets() {
    let start = with_inline_buttons(start_node("S", "Hi"), &[("Go", "X")]);
    let project = Project {
        name: "Sheets".to_string(),
        sheets: vec![
            sheet("a", vec![start, message_node("X", "A")], vec![]),
            sheet("b", vec![message_node("X", "B")], vec![]),
            sheet("c", vec![message_node("X", "C")], vec![]),
        ],
        ..Default::default()
    };
    assert!(validate(project).valid);
}

#[test]
fn test_compile_error_carries_the_report() {
    let error = Compiler::builder(Project::default(), ProjectSettings::default())
        .build()
        .compile()
        .unwrap_err();
    let report = error.report().expect("validation report");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        error.to_string(),
        "Project failed validation with 1 error(s)"
    );
    assert_eq!(
        ReportFormatter::format_report(report),
        "Project has 1 error(s):\n  1. Project has no start command node"
    );
}

#[test]
fn test_followed_auto_transition_cycles_are_rejected() {
    let project = single_sheet(
        vec![
            with_auto_transition(start_node("S", "Hi"), "A", true),
            with_auto_transition(message_node("A", "A"), "B", true),
            with_auto_transition(message_node("B", "B"), "A", true),
            with_auto_transition(message_node("C", "C"), "C", true),
            // Transitions that are only logged never loop.
            with_auto_transition(message_node("D", "D"), "E", false),
            with_auto_transition(message_node("E", "E"), "D", false),
        ],
        vec![],
    );
    let report = validate(project);
    assert_eq!(
        report.errors,
        vec![
            "Auto-transitions that collect input form a cycle: A -> B -> A".to_string(),
            "Auto-transitions that collect input form a cycle: C -> C".to_string(),
        ]
    );
}

#[test]
fn test_auto_transition_chain_without_cycle_is_valid() {
    let project = single_sheet(
        vec![
            with_auto_transition(start_node("S", "Hi"), "A", true),
            with_auto_transition(message_node("A", "A"), "B", true),
            message_node("B", "B"),
        ],
        vec![],
    );
    assert!(validate(project).valid);
}

#[test]
fn test_menu_command_names_follow_telegram_rules() {
    let mut bad = command_node("H", "/My-Help", "Help");
    let mut hidden = command_node("X", "/Not-Listed", "Hidden");
    let mut long = command_node("L", &format!("/{}", "a".repeat(33)), "Long");
    for (node, shown) in [(&mut bad, true), (&mut hidden, false), (&mut long, true)] {
        if let NodeKind::Command(cmd) = &mut node.kind {
            cmd.show_in_menu = shown;
        }
    }
    let project = single_sheet(vec![start_node("S", "Hi"), bad, hidden, long], vec![]);

    let report = validate(project);
    assert_eq!(report.errors.len(), 2, "errors: {:#?}", report.errors);
    assert_eq!(
        report.errors[0],
        "Command '/My-Help' on node 'H' cannot be shown in the menu: names must be 1 to 32 characters of a-z, 0-9 and _"
    );
    assert!(report.errors[1].starts_with("Command '/aaaa"));
}

#[test]
fn test_blank_message_text_is_rejected() {
    let photo = Node {
        id: "P".to_string(),
        position: Position::default(),
        kind: NodeKind::Media(MediaPayload {
            media_kind: MediaKind::Photo,
            source: "https://example.com/a.png".to_string(),
            caption: MessagePayload::default(),
        }),
    };
    let project = single_sheet(
        vec![
            start_node("S", "  "),
            input_node("I", "", "name", None),
            photo,
        ],
        vec![],
    );
    let report = validate(project);
    assert_eq!(
        report.errors,
        vec![
            "Node 'S' has no message text".to_string(),
            "Node 'I' has no message text".to_string(),
        ]
    );
}
