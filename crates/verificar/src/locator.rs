//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a deferred, re-evaluatable query over a [`DomNode`]
//! snapshot: tag filter plus text predicate plus explicit options. It never
//! holds a reference to an element; every use re-resolves against the current
//! page content.
//!
//! # Design Philosophy
//!
//! - **Strict Selection**: by default, more than one qualifying element is a
//!   hard failure (prevents flaky tests that silently click the wrong link)
//! - **Explicit Timeouts**: timeout and poll interval live on the locator,
//!   not in ambient session state
//! - **Exact Text**: exact matching compares the element's visible text,
//!   end-trimmed, byte-for-byte — embedded punctuation and apostrophes count

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dom::DomNode;
use crate::driver::ElementHandle;
use crate::result::{VerificarError, VerificarResult};

/// Default timeout for locator resolution (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for locator resolution (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Text predicate for matching an element's visible text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextMatch {
    /// Match any text
    Any,
    /// Visible text (end-trimmed) equals the string exactly
    Exact(String),
    /// Visible text contains the string
    Contains(String),
}

impl TextMatch {
    /// Check the predicate against an element's visible text
    #[must_use]
    pub fn matches(&self, visible_text: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => visible_text.trim() == expected,
            Self::Contains(needle) => visible_text.contains(needle),
        }
    }
}

/// Policy when more than one element qualifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Fail with `AmbiguousMatch` (default)
    #[default]
    Strict,
    /// Take the first qualifying element in document order
    First,
}

/// Locator options with explicit per-step timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for resolution polling
    pub timeout: Duration,
    /// Polling interval
    pub poll_interval: Duration,
    /// Policy for multiple matches
    pub policy: MatchPolicy,
    /// Whether the element must be visible to qualify
    pub visible: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            policy: MatchPolicy::default(),
            visible: true,
        }
    }
}

/// A deferred query for finding elements in a page snapshot
#[derive(Debug, Clone)]
pub struct Locator {
    /// Tag filter (None matches any element)
    tag: Option<String>,
    /// Text predicate
    text: TextMatch,
    /// Resolution options
    options: LocatorOptions,
}

impl Locator {
    /// Locate elements with a given tag (e.g. `Locator::element("a")`)
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into().to_lowercase()),
            text: TextMatch::Any,
            options: LocatorOptions::default(),
        }
    }

    /// Locate elements of any tag
    #[must_use]
    pub fn any() -> Self {
        Self {
            tag: None,
            text: TextMatch::Any,
            options: LocatorOptions::default(),
        }
    }

    /// Require the visible text to equal the string exactly
    #[must_use]
    pub fn with_exact_text(mut self, text: impl Into<String>) -> Self {
        self.text = TextMatch::Exact(text.into());
        self
    }

    /// Require the visible text to contain the string
    #[must_use]
    pub fn with_text_contains(mut self, text: impl Into<String>) -> Self {
        self.text = TextMatch::Contains(text.into());
        self
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set a custom polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.options.poll_interval = poll_interval;
        self
    }

    /// Set the multiple-match policy
    #[must_use]
    pub const fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.options.policy = policy;
        self
    }

    /// Set the visibility requirement
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.options.visible = visible;
        self
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Human-readable description for error messages
    #[must_use]
    pub fn description(&self) -> String {
        let target = self.tag.as_deref().unwrap_or("any element");
        match &self.text {
            TextMatch::Any => target.to_string(),
            TextMatch::Exact(t) => format!("{target} with exact text {t:?}"),
            TextMatch::Contains(t) => format!("{target} with text containing {t:?}"),
        }
    }

    /// Resolve against a snapshot, returning all qualifying elements in
    /// document order.
    ///
    /// For text queries only the deepest matching elements are returned: an
    /// ancestor whose text matches solely because a descendant's does (a
    /// wrapper around a `Contains` or `Exact` match) is not a separate hit.
    /// `Any` queries return every qualifying element.
    #[must_use]
    pub fn resolve(&self, snapshot: &DomNode) -> Vec<ElementHandle> {
        let mut hits = Vec::new();
        let mut index = 0u64;
        self.resolve_node(snapshot, !snapshot.hidden, &mut index, &mut hits);
        hits
    }

    /// Returns whether this subtree contains a qualifying element.
    fn resolve_node(
        &self,
        node: &DomNode,
        visible: bool,
        index: &mut u64,
        hits: &mut Vec<ElementHandle>,
    ) -> bool {
        let own_index = *index;
        *index += 1;

        let mut child_hit = false;
        for child in &node.children {
            child_hit |= self.resolve_node(child, visible && !child.hidden, index, hits);
        }

        let qualifies = self.tag.as_ref().map_or(true, |t| *t == node.tag)
            && self.text.matches(&node.visible_text())
            && (!self.options.visible || visible)
            && !(child_hit && !matches!(self.text, TextMatch::Any));

        if qualifies {
            // Children were pushed first during recursion; restore document
            // order by position of the pre-order index.
            let pos = hits.partition_point(|h| h.id < own_index);
            hits.insert(
                pos,
                ElementHandle {
                    id: own_index,
                    tag: node.tag.clone(),
                    text: node.visible_text().trim().to_string(),
                    visible,
                },
            );
        }

        qualifies || child_hit
    }

    /// Resolve to a single element under this locator's match policy.
    ///
    /// Returns `Ok(None)` when nothing matches yet (the caller polls),
    /// `AmbiguousMatch` immediately when strict matching finds several.
    pub fn resolve_single(&self, snapshot: &DomNode) -> VerificarResult<Option<ElementHandle>> {
        let mut hits = self.resolve(snapshot);
        match (hits.len(), self.options.policy) {
            (0, _) => Ok(None),
            (1, _) | (_, MatchPolicy::First) => Ok(Some(hits.remove(0))),
            (count, MatchPolicy::Strict) => Err(VerificarError::AmbiguousMatch {
                query: self.description(),
                count,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn blog_listing() -> DomNode {
        DomNode::element("body").with_child(
            DomNode::element("main")
                .with_child(
                    DomNode::element("a")
                        .with_attr("href", "/ca/blog/foslog-v0-3-0")
                        .with_text("Foslog v0.3.0 - Primers Passos"),
                )
                .with_child(
                    DomNode::element("a")
                        .with_attr("href", "/ca/blog/foslog-v0-4-0")
                        .with_text("Foslog v0.4.0 - L'Actualització d'Expansió"),
                ),
        )
    }

    mod text_match_tests {
        use super::*;

        #[test]
        fn test_exact_trims_ends_only() {
            let m = TextMatch::Exact("Gestió de Dades Optimitzada".to_string());
            assert!(m.matches("  Gestió de Dades Optimitzada\n"));
            assert!(!m.matches("Gestió  de Dades Optimitzada"));
        }

        #[test]
        fn test_exact_is_not_substring() {
            let m = TextMatch::Exact("Foslog v0.4.0".to_string());
            assert!(!m.matches("Foslog v0.4.0 - L'Actualització d'Expansió"));
        }

        #[test]
        fn test_exact_keeps_apostrophes() {
            let m = TextMatch::Exact("L'Actualització d'Expansió".to_string());
            assert!(m.matches("L'Actualització d'Expansió"));
            assert!(!m.matches("LActualització dExpansió"));
        }

        #[test]
        fn test_contains() {
            let m = TextMatch::Contains("Dades".to_string());
            assert!(m.matches("Gestió de Dades Optimitzada"));
            assert!(!m.matches("Gestió de memòria"));
        }

        #[test]
        fn test_any_matches_everything() {
            assert!(TextMatch::Any.matches(""));
            assert!(TextMatch::Any.matches("qualsevol"));
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_default_options() {
            let opts = LocatorOptions::default();
            assert_eq!(opts.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
            assert_eq!(
                opts.poll_interval,
                Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            );
            assert_eq!(opts.policy, MatchPolicy::Strict);
            assert!(opts.visible);
        }

        #[test]
        fn test_builder_chain() {
            let locator = Locator::element("a")
                .with_timeout(Duration::from_millis(250))
                .with_poll_interval(Duration::from_millis(10))
                .with_policy(MatchPolicy::First)
                .with_visible(false);
            assert_eq!(locator.options().timeout, Duration::from_millis(250));
            assert_eq!(locator.options().poll_interval, Duration::from_millis(10));
            assert_eq!(locator.options().policy, MatchPolicy::First);
            assert!(!locator.options().visible);
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_exact_anchor_match() {
            let locator = Locator::element("a")
                .with_exact_text("Foslog v0.4.0 - L'Actualització d'Expansió");
            let hits = locator.resolve(&blog_listing());
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].tag, "a");
            assert_eq!(hits[0].text, "Foslog v0.4.0 - L'Actualització d'Expansió");
        }

        #[test]
        fn test_no_match_for_missing_link() {
            let locator = Locator::element("a").with_exact_text("Foslog v0.5.0");
            assert!(locator.resolve(&blog_listing()).is_empty());
        }

        #[test]
        fn test_tag_filter_excludes_other_elements() {
            let locator =
                Locator::element("h1").with_exact_text("Foslog v0.4.0 - L'Actualització d'Expansió");
            assert!(locator.resolve(&blog_listing()).is_empty());
        }

        #[test]
        fn test_hidden_elements_excluded_by_default() {
            let page = DomNode::element("body").with_child(
                DomNode::element("a")
                    .with_hidden(true)
                    .with_text("Enllaç ocult"),
            );
            let locator = Locator::element("a").with_exact_text("Enllaç ocult");
            assert!(locator.resolve(&page).is_empty());

            let relaxed = locator.with_visible(false);
            assert_eq!(relaxed.resolve(&page).len(), 1);
        }

        #[test]
        fn test_ancestor_hidden_hides_descendant() {
            let page = DomNode::element("body").with_child(
                DomNode::element("div")
                    .with_hidden(true)
                    .with_child(DomNode::element("a").with_text("Dins d'un pare ocult")),
            );
            let locator = Locator::element("a").with_exact_text("Dins d'un pare ocult");
            assert!(locator.resolve(&page).is_empty());
        }

        #[test]
        fn test_contains_returns_deepest_match_only() {
            let page = DomNode::element("body").with_child(
                DomNode::element("section")
                    .with_child(DomNode::element("h2").with_text("Gestió de Dades Optimitzada")),
            );
            let locator = Locator::any().with_text_contains("Gestió de Dades Optimitzada");
            let hits = locator.resolve(&page);
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].tag, "h2");
        }

        #[test]
        fn test_exact_wrapper_is_not_a_separate_hit() {
            // A wrapper whose visible text is exactly its child's must not
            // turn an unambiguous page into a strict-mode failure.
            let page = DomNode::element("body").with_child(
                DomNode::element("div").with_child(
                    DomNode::element("a").with_text("Gestió de Dades Optimitzada"),
                ),
            );
            let locator = Locator::any().with_exact_text("Gestió de Dades Optimitzada");
            let hits = locator.resolve(&page);
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].tag, "a");
            assert!(locator.resolve_single(&page).unwrap().is_some());
        }

        #[test]
        fn test_hits_in_document_order() {
            let page = DomNode::element("body")
                .with_child(DomNode::element("a").with_text("Duplicat"))
                .with_child(DomNode::element("a").with_text("Duplicat"));
            let locator = Locator::element("a").with_exact_text("Duplicat");
            let hits = locator.resolve(&page);
            assert_eq!(hits.len(), 2);
            assert!(hits[0].id < hits[1].id);
        }
    }

    mod resolve_single_tests {
        use super::*;

        #[test]
        fn test_single_match() {
            let locator = Locator::element("a")
                .with_exact_text("Foslog v0.4.0 - L'Actualització d'Expansió");
            let hit = locator.resolve_single(&blog_listing()).unwrap();
            assert!(hit.is_some());
        }

        #[test]
        fn test_no_match_is_none_not_error() {
            let locator = Locator::element("a").with_exact_text("absent");
            assert!(locator.resolve_single(&blog_listing()).unwrap().is_none());
        }

        #[test]
        fn test_strict_rejects_duplicates() {
            let page = DomNode::element("body")
                .with_child(DomNode::element("a").with_text("Duplicat"))
                .with_child(DomNode::element("a").with_text("Duplicat"));
            let locator = Locator::element("a").with_exact_text("Duplicat");
            let err = locator.resolve_single(&page).unwrap_err();
            match err {
                VerificarError::AmbiguousMatch { count, .. } => assert_eq!(count, 2),
                other => panic!("expected AmbiguousMatch, got {other}"),
            }
        }

        #[test]
        fn test_first_policy_takes_document_order() {
            let page = DomNode::element("body")
                .with_child(DomNode::element("a").with_attr("href", "/primer").with_text("Duplicat"))
                .with_child(DomNode::element("a").with_attr("href", "/segon").with_text("Duplicat"));
            let locator = Locator::element("a")
                .with_exact_text("Duplicat")
                .with_policy(MatchPolicy::First);
            let hit = locator.resolve_single(&page).unwrap().unwrap();
            // body is index 0, first anchor is index 1
            assert_eq!(hit.id, 1);
        }
    }

    mod description_tests {
        use super::*;

        #[test]
        fn test_description_exact() {
            let locator = Locator::element("a").with_exact_text("Enllaç");
            assert_eq!(locator.description(), "a with exact text \"Enllaç\"");
        }

        #[test]
        fn test_description_contains_any_tag() {
            let locator = Locator::any().with_text_contains("Dades");
            assert_eq!(
                locator.description(),
                "any element with text containing \"Dades\""
            );
        }
    }
}
