//! DOM-like tree capability.
//!
//! Locator matching runs over this tree rather than over any automation
//! library's selector syntax. Drivers produce a [`DomNode`] snapshot of the
//! current page; each locator use re-resolves against a fresh snapshot, so a
//! locator is a deferred query, never a materialized element reference.

use serde::{Deserialize, Serialize};

/// A node in a page snapshot.
///
/// `hidden` covers anything the page hides via styling or layout
/// (`display: none`, `visibility: hidden`, `hidden` attribute, zero-size
/// boxes). A node absent from the snapshot is detached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomNode {
    /// Lowercase tag name (e.g. "a", "div")
    pub tag: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Text owned directly by this node, in order relative to children
    pub text: String,
    /// Child elements in document order
    pub children: Vec<DomNode>,
    /// Whether the node is hidden by styling or layout
    pub hidden: bool,
}

impl DomNode {
    /// Create an element node
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            hidden: false,
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set the node's own text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child element
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Mark the node as hidden
    #[must_use]
    pub const fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Look up an attribute value
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the node is rendered (itself not hidden).
    ///
    /// Visibility of descendants additionally requires every ancestor to be
    /// rendered; [`Self::walk`] tracks that along the traversal path.
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        !self.hidden
    }

    /// Text as a user would see it were this node rendered: the node's own
    /// text plus the text of all non-hidden descendants, in document order.
    ///
    /// The node's own `hidden` flag is deliberately ignored so that hidden
    /// elements can still be found by text when a locator opts out of the
    /// visibility requirement.
    #[must_use]
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.collect_visible_text(&mut out);
        out
    }

    fn collect_visible_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            if !child.hidden {
                child.collect_visible_text(out);
            }
        }
    }

    /// Pre-order traversal of this node and all descendants, including hidden
    /// ones. Yields `(node, visible)` where `visible` is false if the node or
    /// any ancestor on the path is hidden.
    pub fn walk(&self) -> impl Iterator<Item = (&Self, bool)> {
        let mut stack = vec![(self, !self.hidden)];
        std::iter::from_fn(move || {
            let (node, visible) = stack.pop()?;
            for child in node.children.iter().rev() {
                stack.push((child, visible && !child.hidden));
            }
            Some((node, visible))
        })
    }

    /// Number of nodes in the subtree (including this node)
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}
