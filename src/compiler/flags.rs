use super::resolve::ProjectIndex;
use crate::project::{ButtonAction, KeyboardKind, NodeKind, ProjectSettings};
use serde::Serialize;

/// Which optional fragments a compile needs.
///
/// Derived purely from the graph and the project settings; a generator whose
/// flag is off never runs, so the emitted program never references a helper
/// that was not defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub needs_persistence: bool,
    pub needs_safe_send: bool,
    pub needs_comment_annotation: bool,
    pub needs_inter_sheet: bool,
    pub needs_input_capture: bool,
    pub needs_groups: bool,
    pub needs_reply_routing: bool,
    pub needs_auto_chain: bool,
    pub needs_menu: bool,
}

impl FeatureFlags {
    pub fn resolve(index: &ProjectIndex<'_>, settings: &ProjectSettings) -> Self {
        let project = index.project();
        let messages = || project.nodes().map(|(_, node)| node.kind.message());

        let has_inline_keyboard = messages().any(|m| m.keyboard.kind == KeyboardKind::Inline);
        let has_auto_transition = messages().any(|m| m.auto_transition_to.is_some());

        Self {
            needs_persistence: settings.persistence_enabled,
            needs_safe_send: has_inline_keyboard || has_auto_transition,
            needs_comment_annotation: settings.comments_enabled,
            needs_inter_sheet: index.crosses_sheets(),
            needs_input_capture: project
                .nodes()
                .any(|(_, node)| matches!(node.kind, NodeKind::Input(_))),
            needs_groups: !project.groups.is_empty(),
            needs_reply_routing: messages().any(|m| {
                m.keyboard.kind == KeyboardKind::Reply
                    && m.keyboard.buttons.iter().any(|b| {
                        matches!(b.action, ButtonAction::Goto { .. } | ButtonAction::Command { .. })
                    })
            }),
            needs_auto_chain: messages()
                .any(|m| m.auto_transition_to.is_some() && m.collect_user_input),
            needs_menu: project
                .nodes()
                .filter_map(|(_, node)| node.kind.command())
                .any(|cmd| cmd.show_in_menu),
        }
    }
}
