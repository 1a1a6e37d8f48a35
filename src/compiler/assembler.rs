use super::fragments::Fragment;
use ahash::AHashSet;
use log::{debug, error};

/// Orders fragments and checks their cross-references.
///
/// The emitted text is not link-resolved afterwards, so every identifier a
/// fragment requires must be provided by some fragment in the same program.
pub(super) struct Assembler {
    fragments: Vec<Fragment>,
}

impl Assembler {
    pub(super) fn new(mut fragments: Vec<Fragment>) -> Self {
        fragments.sort_by_key(|f| f.kind);
        Self { fragments }
    }

    pub(super) fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Required identifiers no fragment provides, as `(fragment, identifier)`.
    pub(super) fn unresolved(&self) -> Vec<(&'static str, &str)> {
        let provided: AHashSet<&str> = self
            .fragments
            .iter()
            .flat_map(|f| f.provides.iter().map(String::as_str))
            .collect();
        self.fragments
            .iter()
            .flat_map(|f| {
                f.requires
                    .iter()
                    .filter(|name| !provided.contains(name.as_str()))
                    .map(move |name| (f.kind.name(), name.as_str()))
            })
            .collect()
    }

    /// Joins the fragments with two blank lines between them.
    ///
    /// `render` maps each fragment to its final lines, which is where comment
    /// annotation hooks in.
    pub(super) fn assemble<F>(&self, mut render: F) -> String
    where
        F: FnMut(&Fragment) -> Vec<String>,
    {
        let missing = self.unresolved();
        for (fragment, name) in &missing {
            error!(fragment = *fragment, identifier = *name; "Fragment references an identifier nothing defines");
        }

        let mut out = String::new();
        for fragment in self.fragments.iter().filter(|f| !f.lines.is_empty()) {
            if !out.is_empty() {
                out.push_str("\n\n\n");
            }
            out.push_str(&render(fragment).join("\n"));
        }
        out.push('\n');
        debug!(fragments = self.fragments.len(), bytes = out.len(); "Assembled program");
        out
    }
}
