//! In-memory document tree implementing both document ports.
//!
//! Translations are inserted as sibling `p.translation-text` nodes right after
//! their paragraph, the same way a page binding would attach them. Progress
//! and error indicators are tracked per anchor. Nodes can be detached at any
//! time to simulate the page mutating underneath a running mode switch.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::document::{DocumentPort, Matcher, NodeId, Selector};
use crate::error::{TranslateError, TranslateResult};
use crate::render::{RenderingPort, DEFAULT_ERROR_DISPLAY, TRANSLATION_OUTPUT_CLASS};

/// Description of a node to append.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new("p").text(text)
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn matches(&self, matcher: &Matcher) -> bool {
        match matcher {
            Matcher::Id(id) => self.id.as_deref() == Some(*id),
            Matcher::Class(class) => self.classes.iter().any(|c| c == class),
            Matcher::Tag(tag) => self.tag.eq_ignore_ascii_case(tag),
            Matcher::Attr(name, value) => self.attrs.iter().any(|(n, v)| n == name && v == value),
        }
    }
}

struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct AnchorView {
    original_hidden: bool,
    translation: Option<NodeId>,
    progress: Option<String>,
    error: Option<(String, Instant)>,
}

struct Tree {
    nodes: Vec<Node>,
    views: HashMap<NodeId, AnchorView>,
}

const ROOT: NodeId = NodeId::new(0);

impl Tree {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.raw())
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == ROOT {
                return true;
            }
            match self.node(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn ensure_attached(&self, id: NodeId) -> TranslateResult<()> {
        if self.is_attached(id) {
            Ok(())
        } else {
            Err(TranslateError::RenderAttachmentStale(id))
        }
    }

    /// Descendants of `root` in document order, `root` excluded.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(root) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return ordered,
        };
        while let Some(id) = stack.pop() {
            ordered.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        ordered
    }

    fn matches(&self, id: NodeId, matcher: &Matcher) -> bool {
        self.node(id).is_some_and(|n| n.element.matches(matcher))
    }

    fn has_ancestor_matching(&self, id: NodeId, matcher: &Matcher) -> bool {
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(ancestor) = current {
            if self.matches(ancestor, matcher) {
                return true;
            }
            current = self.node(ancestor).and_then(|n| n.parent);
        }
        false
    }

    fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        let mut text = node.element.text.clone();
        for child in &node.children {
            text.push_str(&self.text_content(*child));
        }
        text
    }

    fn push(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            element,
            parent,
            children: Vec::new(),
        });
        id
    }

    fn insert_after(&mut self, sibling: NodeId, element: Element) -> TranslateResult<NodeId> {
        let parent = self
            .node(sibling)
            .and_then(|n| n.parent)
            .ok_or(TranslateError::RenderAttachmentStale(sibling))?;
        let id = self.push(element, Some(parent));
        let children = &mut self.nodes[parent.raw()].children;
        let position = children
            .iter()
            .position(|c| *c == sibling)
            .map_or(children.len(), |p| p + 1);
        children.insert(position, id);
        Ok(id)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.raw()].children.retain(|c| *c != id);
        self.nodes[id.raw()].parent = None;
    }
}

/// Document tree plus render state, shareable across switch futures.
pub struct MemoryDocument {
    tree: Mutex<Tree>,
    error_display: Duration,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document containing only a `body` root.
    pub fn new() -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            views: HashMap::new(),
        };
        tree.push(Element::new("body"), None);
        Self {
            tree: Mutex::new(tree),
            error_display: DEFAULT_ERROR_DISPLAY,
        }
    }

    pub fn with_error_display(mut self, error_display: Duration) -> Self {
        self.error_display = error_display;
        self
    }

    /// Build a chapter page (`#chapters > .userstuff > p*`) from paragraphs.
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let document = Self::new();
        let chapters = document.append(document.root(), Element::new("div").id("chapters"));
        let body = document.append(chapters, Element::new("div").class("userstuff"));
        for paragraph in paragraphs {
            document.append(body, Element::paragraph(paragraph.as_ref()));
        }
        document
    }

    /// Build a chapter page from plain text, one paragraph per blank-line block.
    pub fn from_text(text: &str) -> Self {
        let paragraphs: Vec<String> = text
            .split("\n\n")
            .map(|block| {
                block
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|block| !block.is_empty())
            .collect();
        Self::from_paragraphs(paragraphs)
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Append `element` as the last child of `parent`.
    pub fn append(&self, parent: NodeId, element: Element) -> NodeId {
        let mut tree = self.lock();
        let id = tree.push(element, Some(parent));
        if let Some(node) = tree.nodes.get_mut(parent.raw()) {
            node.children.push(id);
        }
        id
    }

    /// Remove `node` (and its subtree) from the document.
    pub fn detach(&self, node: NodeId) {
        self.lock().detach(node);
    }

    pub fn is_original_visible(&self, anchor: NodeId) -> bool {
        self.lock()
            .views
            .get(&anchor)
            .map_or(true, |view| !view.original_hidden)
    }

    /// Attached translated text for `anchor`, if any.
    pub fn translation(&self, anchor: NodeId) -> Option<String> {
        let tree = self.lock();
        let node = tree.views.get(&anchor)?.translation?;
        if !tree.is_attached(node) {
            return None;
        }
        Some(tree.text_content(node))
    }

    pub fn progress(&self, anchor: NodeId) -> Option<String> {
        self.lock().views.get(&anchor)?.progress.clone()
    }

    /// Error indicator for `anchor`, unless it has already expired.
    pub fn error(&self, anchor: NodeId) -> Option<String> {
        let tree = self.lock();
        let (message, shown_at) = tree.views.get(&anchor)?.error.as_ref()?;
        (shown_at.elapsed() < self.error_display).then(|| message.clone())
    }

    /// Number of translation nodes currently attached anywhere.
    pub fn translation_count(&self) -> usize {
        let tree = self.lock();
        tree.descendants(ROOT)
            .into_iter()
            .filter(|id| tree.matches(*id, &Matcher::Class(TRANSLATION_OUTPUT_CLASS)))
            .count()
    }
}

impl DocumentPort for MemoryDocument {
    fn query_first(&self, selector: &Selector) -> Option<NodeId> {
        let tree = self.lock();
        tree.descendants(ROOT).into_iter().find(|id| {
            tree.matches(*id, &selector.target)
                && selector
                    .scope
                    .as_ref()
                    .map_or(true, |scope| tree.has_ancestor_matching(*id, scope))
        })
    }

    fn query_all(&self, root: NodeId, matcher: &Matcher) -> Vec<NodeId> {
        let tree = self.lock();
        if !tree.is_attached(root) {
            return Vec::new();
        }
        tree.descendants(root)
            .into_iter()
            .filter(|id| tree.matches(*id, matcher))
            .collect()
    }

    fn matches(&self, node: NodeId, matcher: &Matcher) -> bool {
        self.lock().matches(node, matcher)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.lock().node(node).and_then(|n| n.parent)
    }

    fn text_content(&self, node: NodeId) -> String {
        self.lock().text_content(node)
    }
}

impl RenderingPort for MemoryDocument {
    fn is_attached(&self, anchor: NodeId) -> bool {
        self.lock().is_attached(anchor)
    }

    fn show_original(&self, anchor: NodeId) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;
        tree.views.entry(anchor).or_default().original_hidden = false;
        Ok(())
    }

    fn hide_original(&self, anchor: NodeId) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;
        tree.views.entry(anchor).or_default().original_hidden = true;
        Ok(())
    }

    fn show_translation(&self, anchor: NodeId, text: &str) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;

        let existing = tree
            .views
            .get(&anchor)
            .and_then(|view| view.translation)
            .filter(|node| tree.is_attached(*node));

        match existing {
            Some(node) => tree.nodes[node.raw()].element.text = text.to_string(),
            None => {
                let element = Element::paragraph(text)
                    .class(TRANSLATION_OUTPUT_CLASS)
                    .attr("data-index", &anchor.raw().to_string());
                let node = tree.insert_after(anchor, element)?;
                tree.views.entry(anchor).or_default().translation = Some(node);
            }
        }
        Ok(())
    }

    fn remove_translation(&self, anchor: NodeId) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;
        let removed = tree.views.entry(anchor).or_default().translation.take();
        if let Some(node) = removed {
            tree.detach(node);
        }
        Ok(())
    }

    fn show_progress(&self, anchor: NodeId, message: &str) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;
        tree.views.entry(anchor).or_default().progress = Some(message.to_string());
        Ok(())
    }

    fn clear_progress(&self, anchor: NodeId) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;
        tree.views.entry(anchor).or_default().progress = None;
        Ok(())
    }

    fn show_error(&self, anchor: NodeId, message: &str) -> TranslateResult<()> {
        let mut tree = self.lock();
        tree.ensure_attached(anchor)?;
        let view = tree.views.entry(anchor).or_default();
        // An indicator that is still visible is kept as is.
        let still_visible = view
            .error
            .as_ref()
            .is_some_and(|(_, shown_at)| shown_at.elapsed() < self.error_display);
        if !still_visible {
            view.error = Some((message.to_string(), Instant::now()));
        }
        Ok(())
    }
}
