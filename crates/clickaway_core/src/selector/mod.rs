//! Selector parsing and element queries
//!
//! A small CSS-like selector engine used to resolve element sets such as
//! exclusion lists:
//!
//! - Type and universal selectors: `div`, `*`
//! - ID, class and attribute selectors: `#menu`, `.open`, `[data-keep]`, `[role="dialog"]`
//! - Descendant (`a b`) and child (`a > b`) combinators
//! - Selector lists: `#toolbar, .popover`
//!
//! Pseudo-classes and sibling combinators are not supported and fail to
//! parse.
//!
//! # Example
//!
//! ```rust
//! use clickaway_core::selector::SelectorList;
//! use clickaway_core::tree::Document;
//!
//! let mut doc = Document::new();
//! let menu = doc.append_element(doc.root(), "ul").unwrap();
//! doc.add_class(menu, "menu").unwrap();
//!
//! let selector = SelectorList::parse("body > ul.menu").unwrap();
//! assert_eq!(selector.query_all(&doc), vec![menu]);
//! ```

mod parser;

use smallvec::SmallVec;
use thiserror::Error;

use crate::tree::{Document, NodeData, NodeId};

/// Error produced when a selector fails to parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector \"{selector}\" at offset {offset}: {message}")]
pub struct SelectorError {
    /// The selector source that failed
    pub selector: String,
    /// Byte offset into `selector` where parsing stopped
    pub offset: usize,
    /// Human-readable description built from the parser's context stack
    pub message: String,
}

/// A single simple selector inside a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// `*`
    Universal,
    /// Tag name, stored lowercase
    Type(String),
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// `[name]` or `[name=value]`
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn matches(&self, node: &NodeData) -> bool {
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Type(tag) => node.tag == *tag,
            SimpleSelector::Id(id) => node.id.as_deref() == Some(id.as_str()),
            SimpleSelector::Class(class) => node.has_class(class),
            SimpleSelector::Attribute { name, value } => match (node.attributes.get(name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        }
    }
}

/// Simple selectors that must all match the same element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    pub parts: SmallVec<[SimpleSelector; 4]>,
}

impl CompoundSelector {
    fn matches(&self, node: &NodeData) -> bool {
        self.parts.iter().all(|part| part.matches(node))
    }
}

/// Relationship between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor
    Descendant,
    /// `>`: the direct parent
    Child,
}

/// Compound selectors joined by combinators
///
/// `combinators[i]` relates `compounds[i]` (the ancestor side) to
/// `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
    /// Check whether `node` is the subject of this selector
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(doc, node, n - 1),
        }
    }

    /// Match right-to-left, backtracking over ancestors for descendant combinators
    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        let Some(data) = doc.node(node) else {
            return false;
        };
        if !self.compounds[index].matches(data) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|parent| self.matches_at(doc, parent, index - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .any(|ancestor| self.matches_at(doc, ancestor, index - 1)),
        }
    }
}

/// Comma-separated list of selectors; an element matches if any entry matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        parser::parse_selector_list(source)
    }

    /// Check whether a node matches any selector in the list
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, node))
    }

    /// All connected nodes matching the list, in document order
    pub fn query_all(&self, doc: &Document) -> Vec<NodeId> {
        doc.descendants()
            .into_iter()
            .filter(|&node| self.matches(doc, node))
            .collect()
    }

    /// First connected node matching the list, in document order
    pub fn query(&self, doc: &Document) -> Option<NodeId> {
        doc.descendants()
            .into_iter()
            .find(|&node| self.matches(doc, node))
    }
}

impl std::str::FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Document {
    /// Parse `selector` and return every matching connected node in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        Ok(SelectorList::parse(selector)?.query_all(self))
    }

    /// Parse `selector` and return the first matching connected node
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(SelectorList::parse(selector)?.query(self))
    }
}
