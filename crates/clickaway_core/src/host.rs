//! Host environment
//!
//! Bundles the shared [`Document`] with the shared [`EventDispatcher`]. A
//! `Host` is cheap to clone; every clone sees the same tree and listener
//! table.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::events::{event_types, Event, EventDispatcher};
use crate::tree::{Document, NodeId};

/// Document shared between the host and installed listeners
pub type SharedDocument = Rc<RefCell<Document>>;

/// Shared document plus the top-level event target
#[derive(Clone, Debug, Default)]
pub struct Host {
    document: SharedDocument,
    events: Rc<EventDispatcher>,
}

impl Host {
    /// Create a host with an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host around an existing document
    pub fn with_document(document: Document) -> Self {
        Self {
            document: Rc::new(RefCell::new(document)),
            events: Rc::new(EventDispatcher::new()),
        }
    }

    /// Borrow the document
    ///
    /// Panics if the document is mutably borrowed, like any `RefCell`.
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Mutably borrow the document
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    /// The shared document handle
    pub fn shared_document(&self) -> &SharedDocument {
        &self.document
    }

    /// Weak handle to the document, for listeners that must not keep it alive
    pub fn weak_document(&self) -> Weak<RefCell<Document>> {
        Rc::downgrade(&self.document)
    }

    /// The top-level event target
    pub fn events(&self) -> &Rc<EventDispatcher> {
        &self.events
    }

    /// Dispatch an event to every listener of its type
    ///
    /// The document must not be borrowed by the caller while dispatching, so
    /// listeners can read and mutate it.
    pub fn dispatch(&self, event: &Event) -> usize {
        self.events.dispatch(event)
    }

    /// Dispatch a `click` at `target`
    pub fn click(&self, target: NodeId) -> usize {
        self.dispatch(&Event::new(event_types::CLICK, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_clones_share_state() {
        let host = Host::new();
        let other = host.clone();

        let root = host.document().root();
        let child = other.document_mut().append_element(root, "div").unwrap();
        assert!(host.document().contains(root, child));

        let clicks = Rc::new(Cell::new(0));
        let c = Rc::clone(&clicks);
        other
            .events()
            .add_listener(event_types::CLICK, move |_| c.set(c.get() + 1));

        assert_eq!(host.click(child), 1);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_with_existing_document() {
        let mut doc = Document::new();
        let root = doc.root();
        let panel = doc.append_element(root, "div").unwrap();

        let host = Host::with_document(doc);
        assert!(host.document().is_connected(panel));
        assert_eq!(host.events().listener_count(), 0);
    }

    #[test]
    fn test_listener_can_mutate_document() {
        let host = Host::new();
        let root = host.document().root();
        let doc = host.weak_document();

        host.events().add_listener(event_types::CLICK, move |event| {
            if let (Some(doc), Some(target)) = (doc.upgrade(), event.target) {
                doc.borrow_mut().append_element(target, "span").unwrap();
            }
        });

        host.click(root);
        assert_eq!(host.document().children(root).len(), 1);
    }
}
