//! Read-only view of the host document.
//!
//! Extraction never touches the document tree directly; it goes through
//! [`DocumentPort`], so the same logic runs against a live page binding or
//! against [`crate::memory::MemoryDocument`] in tests.

use std::fmt;

/// Opaque handle to a node of the host document.
///
/// Also serves as the render anchor of a text unit: the rendering side uses it
/// to place translated, progress and error content next to the paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single compound-free selector term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// `#id`
    Id(&'static str),
    /// `.class`
    Class(&'static str),
    /// `tag`
    Tag(&'static str),
    /// `[name="value"]`
    Attr(&'static str, &'static str),
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Id(id) => write!(f, "#{}", id),
            Matcher::Class(class) => write!(f, ".{}", class),
            Matcher::Tag(tag) => write!(f, "{}", tag),
            Matcher::Attr(name, value) => write!(f, "[{}=\"{}\"]", name, value),
        }
    }
}

/// A matcher, optionally restricted to descendants of another matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    pub scope: Option<Matcher>,
    pub target: Matcher,
}

impl Selector {
    pub const fn new(target: Matcher) -> Self {
        Self {
            scope: None,
            target,
        }
    }

    /// `scope target` (descendant combinator)
    pub const fn within(scope: Matcher, target: Matcher) -> Self {
        Self {
            scope: Some(scope),
            target,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{} {}", scope, self.target),
            None => write!(f, "{}", self.target),
        }
    }
}

/// Queries the extractor needs from the host document.
pub trait DocumentPort {
    /// First attached node in document order matching `selector`.
    fn query_first(&self, selector: &Selector) -> Option<NodeId>;

    /// Attached descendants of `root` matching `matcher`, in document order.
    fn query_all(&self, root: NodeId, matcher: &Matcher) -> Vec<NodeId>;

    /// Whether `node` itself matches `matcher`.
    fn matches(&self, node: NodeId, matcher: &Matcher) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Concatenated text of `node` and its descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// Nearest inclusive ancestor of `node` matching any of `matchers`.
    fn closest(&self, node: NodeId, matchers: &[Matcher]) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if matchers.iter().any(|m| self.matches(candidate, m)) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }
}
