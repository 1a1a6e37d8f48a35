use crate::error::ResolutionFailure;
use crate::project::{ButtonAction, Connection, Node, NodeKind, NodeRef, Project, Sheet};
use ahash::AHashMap;
use itertools::Itertools;

/// Lookup tables over a project snapshot, shared by the validator, the flag
/// resolver and every generator so they all resolve references the same way.
pub struct ProjectIndex<'a> {
    project: &'a Project,
    by_ref: AHashMap<NodeRef, &'a Node>,
    by_id: AHashMap<&'a str, Vec<NodeRef>>,
}

impl<'a> ProjectIndex<'a> {
    pub fn new(project: &'a Project) -> Self {
        let mut by_ref = AHashMap::new();
        let mut by_id: AHashMap<&'a str, Vec<NodeRef>> = AHashMap::new();
        for (sheet, node) in project.nodes() {
            let node_ref = NodeRef::new(&sheet.id, &node.id);
            // First definition wins; duplicates are reported by the validator.
            by_ref.entry(node_ref.clone()).or_insert(node);
            let refs = by_id.entry(node.id.as_str()).or_default();
            if !refs.contains(&node_ref) {
                refs.push(node_ref);
            }
        }
        Self {
            project,
            by_ref,
            by_id,
        }
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    pub fn node(&self, node_ref: &NodeRef) -> Option<&'a Node> {
        self.by_ref.get(node_ref).copied()
    }

    /// Resolves an unqualified reference made from a node on `from_sheet`.
    ///
    /// The owning sheet is searched first; otherwise the id must be unique
    /// across the remaining sheets.
    pub fn resolve(&self, from_sheet: &str, id: &str) -> Result<NodeRef, ResolutionFailure> {
        let local = NodeRef::new(from_sheet, id);
        if self.by_ref.contains_key(&local) {
            return Ok(local);
        }
        match self.by_id.get(id).map(Vec::as_slice) {
            None | Some([]) => Err(ResolutionFailure::NotFound),
            Some([only]) => Ok(only.clone()),
            Some(many) => Err(ResolutionFailure::Ambiguous(many.len())),
        }
    }

    /// Resolves both endpoints of a connection. `sheet` is the owning sheet, or
    /// `None` for project-level inter-sheet connections.
    pub fn connection_endpoints(
        &self,
        sheet: Option<&Sheet>,
        connection: &Connection,
    ) -> (Option<NodeRef>, Option<NodeRef>) {
        let owner = sheet.map(|s| s.id.as_str());
        let source = self.endpoint(
            connection.source_sheet.as_deref(),
            owner,
            &connection.source,
            false,
        );
        let target = self.endpoint(
            connection.target_sheet.as_deref(),
            owner,
            &connection.target,
            connection.inter_sheet || owner.is_none(),
        );
        (source, target)
    }

    fn endpoint(
        &self,
        explicit_sheet: Option<&str>,
        owner: Option<&str>,
        id: &str,
        may_cross: bool,
    ) -> Option<NodeRef> {
        if let Some(sheet) = explicit_sheet {
            let node_ref = NodeRef::new(sheet, id);
            return self.by_ref.contains_key(&node_ref).then_some(node_ref);
        }
        match owner {
            Some(owner) if may_cross => self.resolve(owner, id).ok(),
            Some(owner) => {
                let node_ref = NodeRef::new(owner, id);
                self.by_ref.contains_key(&node_ref).then_some(node_ref)
            }
            None => match self.by_id.get(id).map(Vec::as_slice) {
                Some([only]) => Some(only.clone()),
                _ => None,
            },
        }
    }

    /// Every reference a node makes to another node, in declaration order:
    /// button targets, then the auto-transition target, then the input continuation.
    pub fn outgoing_refs(&self, sheet: &Sheet, node: &Node) -> Vec<Result<NodeRef, ResolutionFailure>> {
        let message = node.kind.message();
        let buttons = message.keyboard.buttons.iter().filter_map(|b| match &b.action {
            ButtonAction::Goto { target } => Some(target.as_str()),
            _ => None,
        });
        let auto = message.auto_transition_to.as_deref();
        let next = match &node.kind {
            NodeKind::Input(input) => input.next.as_deref(),
            _ => None,
        };
        buttons
            .chain(auto)
            .chain(next)
            .map(|id| self.resolve(&sheet.id, id))
            .collect()
    }

    /// The ordered set of distinct transition targets: connection targets first,
    /// then targets reached through buttons, auto-transitions and input continuations.
    pub fn transition_targets(&self) -> Vec<NodeRef> {
        let from_connections = self
            .project
            .connections()
            .filter_map(|(sheet, c)| self.connection_endpoints(sheet, c).1);
        let from_nodes = self
            .project
            .nodes()
            .flat_map(|(sheet, node)| self.outgoing_refs(sheet, node))
            .filter_map(Result::ok);
        from_connections.chain(from_nodes).unique().collect()
    }

    /// Resolves the auto-transition target of a node, if it has one.
    pub fn auto_transition(&self, node_ref: &NodeRef) -> Option<NodeRef> {
        let node = self.node(node_ref)?;
        let target = node.kind.message().auto_transition_to.as_deref()?;
        self.resolve(&node_ref.sheet, target).ok()
    }

    /// True when any connection or reference crosses a sheet boundary.
    pub fn crosses_sheets(&self) -> bool {
        if !self.project.inter_sheet_connections.is_empty() {
            return true;
        }
        let connections = self.project.connections().any(|(sheet, c)| {
            match self.connection_endpoints(sheet, c) {
                (Some(s), Some(t)) => s.sheet != t.sheet,
                _ => false,
            }
        });
        connections
            || self.project.nodes().any(|(sheet, node)| {
                self.outgoing_refs(sheet, node)
                    .iter()
                    .flatten()
                    .any(|r| r.sheet != sheet.id)
            })
    }
}
