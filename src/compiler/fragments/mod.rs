//! Fragment generators: one emitter per concern of the emitted program.
//!
//! Each generator is a pure function of the [`GenerationContext`]; none looks at
//! another generator's output. The [`Assembler`](super::assembler::Assembler)
//! combines them in [`FragmentKind`] order.

use super::flags::FeatureFlags;
use super::resolve::ProjectIndex;
use super::symbols::SymbolTable;
use crate::project::{Project, ProjectSettings};

mod bootstrap;
mod entry;
mod groups;
mod handlers;
mod navigation;
mod persistence;
mod preamble;
mod predicates;
mod render;
mod safe_send;
mod variables;

pub use bootstrap::TOKEN_PLACEHOLDER;
pub use persistence::PERSISTENCE_IDENTIFIERS;

/// Everything a generator may read. Borrowed, never mutated.
pub struct GenerationContext<'a> {
    pub project: &'a Project,
    pub index: &'a ProjectIndex<'a>,
    pub symbols: &'a SymbolTable,
    pub flags: &'a FeatureFlags,
    pub settings: &'a ProjectSettings,
    pub display_name: &'a str,
}

/// The slices of the emitted program, declared in assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentKind {
    Preamble,
    Bootstrap,
    Predicates,
    Persistence,
    Variables,
    SafeSend,
    Handlers,
    Navigation,
    Groups,
    Entry,
}

impl FragmentKind {
    pub fn name(self) -> &'static str {
        match self {
            FragmentKind::Preamble => "preamble",
            FragmentKind::Bootstrap => "bootstrap",
            FragmentKind::Predicates => "predicates",
            FragmentKind::Persistence => "persistence",
            FragmentKind::Variables => "variables",
            FragmentKind::SafeSend => "safe_send",
            FragmentKind::Handlers => "handlers",
            FragmentKind::Navigation => "navigation",
            FragmentKind::Groups => "groups",
            FragmentKind::Entry => "entry",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FragmentKind::Preamble => "Imports and environment",
            FragmentKind::Bootstrap => "Bot bootstrap",
            FragmentKind::Predicates => "Access predicates",
            FragmentKind::Persistence => "Persistence layer",
            FragmentKind::Variables => "Variable substitution",
            FragmentKind::SafeSend => "Safe send and edit",
            FragmentKind::Handlers => "Handlers",
            FragmentKind::Navigation => "Navigation",
            FragmentKind::Groups => "Connected groups",
            FragmentKind::Entry => "Entry point",
        }
    }
}

/// One generated slice of the program, with the identifiers it defines and
/// the identifiers it expects other fragments to define.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub lines: Vec<String>,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
}

impl Fragment {
    pub fn new(kind: FragmentKind, lines: Vec<String>) -> Self {
        Self {
            kind,
            lines,
            provides: Vec::new(),
            requires: Vec::new(),
        }
    }

    pub fn providing<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn requiring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn source(&self) -> String {
        self.lines.join("\n")
    }
}

/// Defines the contract for one emitter.
pub trait FragmentGenerator: Send + Sync {
    fn kind(&self) -> FragmentKind;

    /// Whether the current flags call for this fragment at all.
    fn is_enabled(&self, _flags: &FeatureFlags) -> bool {
        true
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment;
}

/// Master macro registering the default generators in assembly order.
macro_rules! define_generators {
    ( $( $kind:ident => $generator:path ),* $(,)? ) => {
        /// The default generator set, one per [`FragmentKind`].
        pub fn default_generators() -> Vec<Box<dyn FragmentGenerator>> {
            vec![ $( Box::new($generator) ),* ]
        }

        #[cfg(test)]
        const REGISTERED_KINDS: &[FragmentKind] = &[ $( FragmentKind::$kind ),* ];
    };
}

define_generators! {
    Preamble => preamble::PreambleGenerator,
    Bootstrap => bootstrap::BootstrapGenerator,
    Predicates => predicates::PredicateGenerator,
    Persistence => persistence::PersistenceGenerator,
    Variables => variables::VariableGenerator,
    SafeSend => safe_send::SafeSendGenerator,
    Handlers => handlers::HandlerGenerator,
    Navigation => navigation::NavigationGenerator,
    Groups => groups::GroupGenerator,
    Entry => entry::EntryGenerator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_matches_kind_order() {
        let generators = default_generators();
        let kinds: Vec<_> = generators.iter().map(|g| g.kind()).collect();
        assert_eq!(kinds, REGISTERED_KINDS);
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
    }
}
