//! Unit tests for core botflow functionality.
mod common;
use botflow::compiler::symbols::{SymbolTable, sanitize};
use botflow::project::command_name;
use botflow::prelude::*;
use botflow::runtime::{VariableTiers, placeholders};
use common::*;
use serde_json::json;

#[test]
fn test_command_name_strips_slash_and_space() {
    assert_eq!(command_name("/start"), "start");
    assert_eq!(command_name("  help "), "help");
    assert_eq!(command_name("//menu"), "menu");
}

#[test]
fn test_media_kind_aliases() {
    assert_eq!(MediaKind::parse("Image"), Some(MediaKind::Photo));
    assert_eq!(MediaKind::parse("gif"), Some(MediaKind::Animation));
    assert_eq!(MediaKind::parse("file"), Some(MediaKind::Document));
    assert_eq!(MediaKind::parse("sticker"), None);
    assert_eq!(MediaKind::Video.send_method(), "send_video");
    assert_eq!(MediaKind::Audio.argument(), "audio");
}

#[test]
fn test_symbol_table_follows_project_order() {
    let project = single_sheet(
        vec![
            start_node("node-1", "a"),
            message_node("node_1", "b"),
            command_node("c", "/my-cmd", "c"),
        ],
        vec![],
    );
    let symbols = SymbolTable::build(&project);
    assert_eq!(symbols.node(&NodeRef::new("main", "node-1")), "node_1");
    assert_eq!(symbols.node(&NodeRef::new("main", "node_1")), "node_1_2");
    assert_eq!(symbols.command_handler("my-cmd"), "my_cmd_handler");
    assert_eq!(symbols.command_callback_data("my-cmd"), "cmd:my-cmd");
    assert_eq!(symbols.node_count(), 3);
    assert_eq!(symbols.command_count(), 2);
    assert_eq!(sanitize("def"), "def_");
}

#[test]
fn test_variable_tiers_render_preview() {
    let tiers = VariableTiers {
        durable: [("city".to_string(), json!("Oslo")), ("name".to_string(), json!("Old"))]
            .into_iter()
            .collect(),
        local: [("name".to_string(), json!("New"))].into_iter().collect(),
    };
    assert_eq!(
        tiers.render("{name} from {city}, {missing}"),
        "New from Oslo, {missing}"
    );
    assert_eq!(placeholders("{a} {b} {a} {not valid}"), vec!["a", "b"]);
}

#[test]
fn test_feature_flags_follow_graph() {
    let compiler = Compiler::builder(create_menu_project(), ProjectSettings::default()).build();
    let flags = compiler.feature_flags();
    assert!(flags.needs_safe_send);
    assert!(flags.needs_input_capture);
    assert!(!flags.needs_persistence);
    assert!(!flags.needs_reply_routing);
    assert!(!flags.needs_auto_chain);
    assert!(!flags.needs_inter_sheet);
    assert!(!flags.needs_groups);
    assert!(!flags.needs_menu);

    let minimal = Compiler::builder(create_minimal_project(), ProjectSettings::default())
        .build()
        .feature_flags();
    assert_eq!(minimal, FeatureFlags::default());
}

#[test]
fn test_report_formatter_summary() {
    let compiler = Compiler::builder(create_minimal_project(), ProjectSettings::default()).build();
    let artifact = compiler.compile().unwrap();
    let summary = ReportFormatter::format_summary(&artifact, &compiler.feature_flags());

    let mut lines = summary.lines();
    assert_eq!(
        lines.next(),
        Some(format!("bot.py: {} lines", artifact.code().lines().count()).as_str())
    );
    assert_eq!(lines.next(), Some("Features: none"));
    assert!(summary.contains("  + requirements.txt ("));
    assert_eq!(
        ReportFormatter::format_report(artifact.report()),
        "Project is valid"
    );
}

#[test]
fn test_settings_from_camel_case_json() {
    let settings: ProjectSettings =
        serde_json::from_str(r#"{ "persistenceEnabled": true, "adminIds": [1, 2] }"#).unwrap();
    assert!(settings.persistence_enabled);
    assert!(!settings.comments_enabled);
    assert_eq!(settings.admin_ids, vec![1, 2]);
}

#[test]
fn test_project_model_serializes_with_type_tags() {
    let project = create_minimal_project();
    let value = serde_json::to_value(&project).unwrap();
    assert_eq!(value["sheets"][0]["nodes"][0]["kind"]["type"], "start");
    assert_eq!(value["sheets"][0]["nodes"][1]["kind"]["type"], "message");

    let back: Project = serde_json::from_value(value).unwrap();
    assert_eq!(back.sheets[0].nodes.len(), 2);
    assert!(!back.is_empty());
}
