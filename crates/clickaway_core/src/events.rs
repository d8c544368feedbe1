//! Event dispatch for the top-level event target
//!
//! The [`EventDispatcher`] is the process-wide listener table every outside
//! detector subscribes to. Listeners are keyed by event type name and
//! identified by the [`ListenerId`] returned at installation; removal takes
//! that exact token, so a listener can never be "removed" by passing a
//! look-alike closure.
//!
//! # Architecture
//!
//! ```text
//! Host input (click at node)
//!     ↓
//! Event { event_type: "click", target: Some(node) }
//!     ↓
//! EventDispatcher::dispatch (listeners for "click", in install order)
//!     ↓
//! Listener callbacks
//! ```
//!
//! Uses `Rc`/`RefCell` since dispatch is single-threaded. Listeners may add
//! or remove listeners while a dispatch is running; a listener removed by an
//! earlier listener in the same turn is skipped.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::tree::NodeId;

/// Well-known event type names
pub mod event_types {
    /// Primary pointer activation
    pub const CLICK: &str = "click";
    pub const MOUSE_DOWN: &str = "mousedown";
    pub const MOUSE_UP: &str = "mouseup";
    pub const POINTER_DOWN: &str = "pointerdown";
    pub const POINTER_UP: &str = "pointerup";
    pub const TOUCH_START: &str = "touchstart";
    pub const TOUCH_END: &str = "touchend";
    pub const KEY_DOWN: &str = "keydown";
    pub const KEY_UP: &str = "keyup";
    /// Focus moved onto an element
    pub const FOCUS_IN: &str = "focusin";
}

new_key_type! {
    /// Token identifying an installed listener
    pub struct ListenerId;
}

/// An input event delivered by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Event type name (`click`, `keydown`, ...)
    pub event_type: String,
    /// The node the event originated from, if any
    pub target: Option<NodeId>,
}

impl Event {
    /// Create an event targeted at a node
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target: Some(target),
        }
    }

    /// Create an event with no origin node (e.g. synthesized by the host)
    pub fn untargeted(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            target: None,
        }
    }
}

/// Listener callback
pub type Listener = Rc<dyn Fn(&Event)>;

struct ListenerEntry {
    event_type: String,
    listener: Listener,
}

/// Process-wide listener table
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RefCell<SlotMap<ListenerId, ListenerEntry>>,
    /// Install order per event type
    by_type: RefCell<FxHashMap<String, SmallVec<[ListenerId; 4]>>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a listener for `event_type`
    ///
    /// Every call installs a new listener, even for an identical closure.
    pub fn add_listener<F>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) + 'static,
    {
        let event_type = event_type.into();
        let id = self.listeners.borrow_mut().insert(ListenerEntry {
            event_type: event_type.clone(),
            listener: Rc::new(listener),
        });
        self.by_type
            .borrow_mut()
            .entry(event_type)
            .or_default()
            .push(id);
        id
    }

    /// Uninstall the listener identified by `id`
    ///
    /// Returns false if the token was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let Some(entry) = self.listeners.borrow_mut().remove(id) else {
            return false;
        };

        let mut by_type = self.by_type.borrow_mut();
        if let Some(ids) = by_type.get_mut(&entry.event_type) {
            ids.retain(|i| *i != id);
            if ids.is_empty() {
                by_type.remove(&entry.event_type);
            }
        }
        true
    }

    /// Check whether a listener token is still installed
    pub fn is_installed(&self, id: ListenerId) -> bool {
        self.listeners.borrow().contains_key(id)
    }

    /// Total number of installed listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of listeners installed for one event type
    pub fn listener_count_for(&self, event_type: &str) -> usize {
        self.by_type
            .borrow()
            .get(event_type)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    /// Deliver an event to every listener of its type
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        // Snapshot the install order so listeners can mutate the table
        let ids: SmallVec<[ListenerId; 8]> = match self.by_type.borrow().get(&event.event_type) {
            Some(ids) => ids.iter().copied().collect(),
            None => return 0,
        };

        let mut invoked = 0;
        for id in ids {
            // Re-check each token so listeners removed mid-dispatch don't run
            let listener = match self.listeners.borrow().get(id) {
                Some(entry) => Rc::clone(&entry.listener),
                None => continue,
            };
            listener(event);
            invoked += 1;
        }

        tracing::trace!(
            event_type = %event.event_type,
            invoked,
            "dispatched event"
        );
        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn target() -> NodeId {
        crate::tree::Document::new().root()
    }

    #[test]
    fn test_dispatch_by_type_in_install_order() {
        let dispatcher = EventDispatcher::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        dispatcher.add_listener(event_types::CLICK, move |_| l.borrow_mut().push("first"));
        let l = Rc::clone(&log);
        dispatcher.add_listener(event_types::KEY_DOWN, move |_| l.borrow_mut().push("key"));
        let l = Rc::clone(&log);
        dispatcher.add_listener(event_types::CLICK, move |_| l.borrow_mut().push("second"));

        let invoked = dispatcher.dispatch(&Event::new(event_types::CLICK, target()));

        assert_eq!(invoked, 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_remove_by_token() {
        let dispatcher = EventDispatcher::new();
        let count = Rc::new(Cell::new(0));

        let c = Rc::clone(&count);
        let id = dispatcher.add_listener(event_types::CLICK, move |_| c.set(c.get() + 1));
        assert_eq!(dispatcher.listener_count_for(event_types::CLICK), 1);

        assert!(dispatcher.remove_listener(id));
        assert!(!dispatcher.remove_listener(id));
        assert!(!dispatcher.is_installed(id));
        assert_eq!(dispatcher.listener_count(), 0);
        assert_eq!(dispatcher.listener_count_for(event_types::CLICK), 0);

        dispatcher.dispatch(&Event::new(event_types::CLICK, target()));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_identical_closures_install_twice() {
        let dispatcher = EventDispatcher::new();
        let count = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let c = Rc::clone(&count);
            dispatcher.add_listener(event_types::CLICK, move |_| c.set(c.get() + 1));
        }

        dispatcher.dispatch(&Event::untargeted(event_types::CLICK));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let dispatcher = Rc::new(EventDispatcher::new());
        let second_ran = Rc::new(Cell::new(false));
        let victim: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let d = Rc::downgrade(&dispatcher);
        let v = Rc::clone(&victim);
        dispatcher.add_listener(event_types::CLICK, move |_| {
            if let (Some(d), Some(id)) = (d.upgrade(), v.get()) {
                d.remove_listener(id);
            }
        });

        let ran = Rc::clone(&second_ran);
        let id = dispatcher.add_listener(event_types::CLICK, move |_| ran.set(true));
        victim.set(Some(id));

        let invoked = dispatcher.dispatch(&Event::untargeted(event_types::CLICK));

        assert_eq!(invoked, 1);
        assert!(!second_ran.get());
    }

    #[test]
    fn test_listener_added_mid_dispatch_waits_for_next_event() {
        let dispatcher = Rc::new(EventDispatcher::new());
        let count = Rc::new(Cell::new(0));

        let d = Rc::downgrade(&dispatcher);
        let c = Rc::clone(&count);
        dispatcher.add_listener(event_types::CLICK, move |_| {
            if let Some(d) = d.upgrade() {
                let c = Rc::clone(&c);
                d.add_listener(event_types::KEY_UP, move |_| c.set(c.get() + 1));
            }
        });

        assert_eq!(dispatcher.dispatch(&Event::untargeted(event_types::CLICK)), 1);
        assert_eq!(dispatcher.listener_count_for(event_types::KEY_UP), 1);
        assert_eq!(dispatcher.dispatch(&Event::untargeted(event_types::KEY_UP)), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_dispatch_without_listeners() {
        let dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch(&Event::untargeted("scroll")), 0);
    }
}
