use super::resolve::ProjectIndex;
use crate::error::{Endpoint, ValidationIssue};
use crate::project::{ButtonAction, NodeKind, NodeRef, Project, ValidationReport};
use ahash::{AHashMap, AHashSet};
use log::debug;

/// Checks the structural invariants of a project graph.
///
/// Every check runs regardless of earlier failures, so the report lists all
/// defects at once. Pure inspection: nothing is modified.
pub struct Validator<'a> {
    project: &'a Project,
    index: &'a ProjectIndex<'a>,
}

impl<'a> Validator<'a> {
    pub fn new(project: &'a Project, index: &'a ProjectIndex<'a>) -> Self {
        Self { project, index }
    }

    pub fn validate(&self) -> ValidationReport {
        let issues = self.issues();
        debug!(issues = issues.len(); "Validation finished");
        ValidationReport::from_errors(issues.iter().map(ToString::to_string).collect())
    }

    /// All structural defects, in check order.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_start_node(&mut issues);
        self.check_unique_commands(&mut issues);
        self.check_menu_commands(&mut issues);
        self.check_connections(&mut issues);
        self.check_auto_transitions(&mut issues);
        self.check_auto_transition_cycles(&mut issues);
        self.check_unique_node_ids(&mut issues);
        self.check_node_references(&mut issues);
        self.check_message_text(&mut issues);
        issues
    }

    fn check_start_node(&self, issues: &mut Vec<ValidationIssue>) {
        let has_start = self
            .project
            .nodes()
            .any(|(_, node)| matches!(node.kind, NodeKind::Start(_)));
        if !has_start {
            issues.push(ValidationIssue::MissingStartNode);
        }
    }

    fn check_unique_commands(&self, issues: &mut Vec<ValidationIssue>) {
        let mut owners: Vec<(&str, Vec<String>)> = Vec::new();
        for (_, node) in self.project.nodes() {
            let Some(cmd) = node.kind.command() else {
                continue;
            };
            let name = cmd.name();
            match owners.iter_mut().find(|(c, _)| *c == name) {
                Some((_, nodes)) => nodes.push(node.id.clone()),
                None => owners.push((name, vec![node.id.clone()])),
            }
        }
        for (command, nodes) in owners.into_iter().filter(|(_, n)| n.len() > 1) {
            issues.push(ValidationIssue::DuplicateCommand {
                command: command.to_string(),
                count: nodes.len(),
                nodes,
            });
        }
    }

    /// Menu entries go through `set_my_commands`, which rejects anything
    /// outside Telegram's command alphabet.
    fn check_menu_commands(&self, issues: &mut Vec<ValidationIssue>) {
        for (_, node) in self.project.nodes() {
            let Some(cmd) = node.kind.command() else {
                continue;
            };
            if cmd.show_in_menu && !is_menu_command(cmd.name()) {
                issues.push(ValidationIssue::InvalidMenuCommand {
                    node_id: node.id.clone(),
                    command: cmd.name().to_string(),
                });
            }
        }
    }

    fn check_connections(&self, issues: &mut Vec<ValidationIssue>) {
        for (sheet, connection) in self.project.connections() {
            let (source, target) = self.index.connection_endpoints(sheet, connection);
            let endpoints = [
                (source.is_none(), Endpoint::Source, &connection.source, &connection.source_sheet),
                (target.is_none(), Endpoint::Target, &connection.target, &connection.target_sheet),
            ];
            for (missing, endpoint, id, explicit_sheet) in endpoints {
                if !missing {
                    continue;
                }
                let scope = explicit_sheet
                    .clone()
                    .or_else(|| sheet.map(|s| s.id.clone()));
                issues.push(ValidationIssue::DanglingConnection {
                    source_id: connection.source.clone(),
                    target_id: connection.target.clone(),
                    endpoint,
                    missing: id.clone(),
                    sheet: scope,
                });
            }
        }
    }

    fn check_auto_transitions(&self, issues: &mut Vec<ValidationIssue>) {
        for (sheet, node) in self.project.nodes() {
            let Some(target) = node.kind.message().auto_transition_to.as_deref() else {
                continue;
            };
            if let Err(reason) = self.index.resolve(&sheet.id, target) {
                issues.push(ValidationIssue::UnresolvedAutoTransition {
                    node_id: node.id.clone(),
                    target: target.to_string(),
                    reason,
                });
            }
        }
    }

    /// Followed auto-transitions call the target handler directly, so a cycle
    /// among them never returns. Each node has at most one such edge; every
    /// cycle is reported once, starting at its first node in project order.
    fn check_auto_transition_cycles(&self, issues: &mut Vec<ValidationIssue>) {
        let mut walked: AHashMap<NodeRef, usize> = AHashMap::new();
        for (walk, (sheet, node)) in self.project.nodes().enumerate() {
            let mut path: Vec<NodeRef> = Vec::new();
            let mut current = NodeRef::new(&sheet.id, &node.id);
            loop {
                if let Some(&seen) = walked.get(&current) {
                    if seen == walk {
                        let start = path.iter().position(|r| *r == current).unwrap_or(0);
                        issues.push(ValidationIssue::AutoTransitionCycle {
                            nodes: path[start..].iter().map(|r| r.node.clone()).collect(),
                        });
                    }
                    break;
                }
                walked.insert(current.clone(), walk);
                path.push(current.clone());
                match self.followed_transition(&current) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
    }

    fn followed_transition(&self, node_ref: &NodeRef) -> Option<NodeRef> {
        let node = self.index.node(node_ref)?;
        if !node.kind.message().collect_user_input {
            return None;
        }
        self.index.auto_transition(node_ref)
    }

    fn check_unique_node_ids(&self, issues: &mut Vec<ValidationIssue>) {
        for sheet in &self.project.sheets {
            let mut seen = AHashSet::new();
            let mut reported = AHashSet::new();
            for node in &sheet.nodes {
                if !seen.insert(node.id.as_str()) && reported.insert(node.id.as_str()) {
                    issues.push(ValidationIssue::DuplicateNodeId {
                        sheet: sheet.id.clone(),
                        node_id: node.id.clone(),
                    });
                }
            }
        }
    }

    fn check_node_references(&self, issues: &mut Vec<ValidationIssue>) {
        for (sheet, node) in self.project.nodes() {
            let message = node.kind.message();
            for button in &message.keyboard.buttons {
                let ButtonAction::Goto { target } = &button.action else {
                    continue;
                };
                if let Err(reason) = self.index.resolve(&sheet.id, target) {
                    issues.push(ValidationIssue::UnresolvedButtonTarget {
                        node_id: node.id.clone(),
                        button: button.text.clone(),
                        target: target.clone(),
                        reason,
                    });
                }
            }
            if let NodeKind::Input(input) = &node.kind {
                if let Some(next) = &input.next {
                    if let Err(reason) = self.index.resolve(&sheet.id, next) {
                        issues.push(ValidationIssue::UnresolvedInputTarget {
                            node_id: node.id.clone(),
                            target: next.clone(),
                            reason,
                        });
                    }
                }
            }
        }
    }

    /// Telegram refuses to send an empty message. Media nodes only carry an
    /// optional caption.
    fn check_message_text(&self, issues: &mut Vec<ValidationIssue>) {
        for (_, node) in self.project.nodes() {
            if matches!(node.kind, NodeKind::Media(_)) {
                continue;
            }
            if node.kind.message().text.trim().is_empty() {
                issues.push(ValidationIssue::EmptyMessageText {
                    node_id: node.id.clone(),
                });
            }
        }
    }
}

fn is_menu_command(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
