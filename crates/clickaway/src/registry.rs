//! Outside-click registration
//!
//! [`OutsideRegistry`] installs one global listener per (element, trigger
//! event type) on the host's event dispatcher and keeps the returned
//! [`ListenerId`] tokens so removal detaches exactly what was installed.
//!
//! # Architecture
//!
//! ```text
//! register(owner, element, callback, config)
//!     ↓ resolve trigger events + exclusion snapshot
//! EventDispatcher::add_listener (one per trigger type)
//!     ↓ on dispatch
//! is_outside(event, document, element, excluded)
//!     ↓ true
//! callback(owner, event)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use clickaway::prelude::*;
//!
//! let host = Host::new();
//! let root = host.document().root();
//! let menu = host.document_mut().append_element(root, "ul").unwrap();
//! let page = host.document_mut().append_element(root, "main").unwrap();
//!
//! let registry = OutsideRegistry::new(host.clone());
//! let open = Rc::new(Cell::new(true));
//!
//! registry.register(&open, menu, |open: &Cell<bool>, _| open.set(false), &OutsideConfig::new());
//!
//! host.click(menu);
//! assert!(open.get());
//! host.click(page);
//! assert!(!open.get());
//!
//! registry.remove(menu, &OutsideConfig::new());
//! assert_eq!(host.events().listener_count(), 0);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use clickaway_core::{Document, Event, Host, ListenerId, NodeId};

use crate::config::{resolve_excluded_nodes, resolve_trigger_events, OutsideConfig};
use crate::evaluator::is_outside;

/// Marker set on a reference element while it has listeners installed
pub const REGISTERED_MARKER: &str = "clickaway-registered";

/// Callback invoked for an outside event
pub type OutsideCallback = Rc<dyn Fn(&Event)>;

/// Identifies one registration of an element
///
/// Each successful registration gets a fresh token, so a holder can tell its
/// own registration apart from a later one on the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationToken(u64);

/// Bookkeeping for one registered element
struct Registration {
    token: RegistrationToken,
    /// Installed listeners, in trigger order
    listeners: SmallVec<[(String, ListenerId); 2]>,
    /// Excluded nodes resolved at registration time
    excluded: Rc<[NodeId]>,
}

/// Statistics about a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Elements with an active registration
    pub registered: usize,
    /// Listeners installed on the dispatcher by this registry
    pub listeners: usize,
}

/// Installs and removes outside-click listeners for reference elements
///
/// Registration is idempotent per element: while an element carries
/// [`REGISTERED_MARKER`] further `register` calls are no-ops. Dropping the
/// registry removes every listener it installed.
///
/// Records for elements that have been removed from the document are
/// pruned on the next `register`, `stats` or `registered_count` call.
pub struct OutsideRegistry {
    host: Host,
    records: RefCell<FxHashMap<NodeId, Registration>>,
    next_token: Cell<u64>,
}

impl std::fmt::Debug for OutsideRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutsideRegistry")
            .field("registered", &self.records.try_borrow().map(|r| r.len()).ok())
            .finish()
    }
}

impl OutsideRegistry {
    /// Create a registry that installs listeners on `host`
    pub fn new(host: Host) -> Self {
        Self {
            host,
            records: RefCell::new(FxHashMap::default()),
            next_token: Cell::new(0),
        }
    }

    /// The host this registry installs listeners on
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Register `callback`, bound to `owner`, for events outside `element`
    ///
    /// The owner is held weakly; once it is dropped the callback stops
    /// running. Returns false without installing anything if `element` is
    /// already registered or does not exist.
    pub fn register<O, F>(
        &self,
        owner: &Rc<O>,
        element: NodeId,
        callback: F,
        config: &OutsideConfig,
    ) -> bool
    where
        O: 'static,
        F: Fn(&O, &Event) + 'static,
    {
        self.register_with_token(owner, element, callback, config).is_some()
    }

    /// Like [`register`](Self::register), returning the token of the new
    /// registration for use with [`remove_with_token`](Self::remove_with_token)
    pub fn register_with_token<O, F>(
        &self,
        owner: &Rc<O>,
        element: NodeId,
        callback: F,
        config: &OutsideConfig,
    ) -> Option<RegistrationToken>
    where
        O: 'static,
        F: Fn(&O, &Event) + 'static,
    {
        let owner: Weak<O> = Rc::downgrade(owner);
        self.install(
            element,
            config,
            Rc::new(move |event: &Event| match owner.upgrade() {
                Some(owner) => callback(&*owner, event),
                None => tracing::trace!("outside-click owner dropped, skipping callback"),
            }),
        )
    }

    /// Register a free-standing callback for events outside `element`
    pub fn register_fn<F>(&self, element: NodeId, callback: F, config: &OutsideConfig) -> bool
    where
        F: Fn(&Event) + 'static,
    {
        self.install(element, config, Rc::new(callback)).is_some()
    }

    fn install(
        &self,
        element: NodeId,
        config: &OutsideConfig,
        callback: OutsideCallback,
    ) -> Option<RegistrationToken> {
        self.prune();

        let excluded: Rc<[NodeId]> = {
            let Ok(mut doc) = self.host.shared_document().try_borrow_mut() else {
                tracing::warn!(?element, "document is borrowed, outside-click registration skipped");
                return None;
            };

            if !doc.exists(element) {
                tracing::warn!(?element, "cannot register outside-click for a missing element");
                return None;
            }
            if doc.has_marker(element, REGISTERED_MARKER)
                || self.records.borrow().contains_key(&element)
            {
                tracing::debug!(?element, "element already registered, ignoring");
                return None;
            }

            let excluded = resolve_excluded_nodes(config, &doc);
            doc.set_marker(element, REGISTERED_MARKER);
            excluded.into()
        };

        let events = self.host.events();
        let mut listeners: SmallVec<[(String, ListenerId); 2]> = SmallVec::new();
        for event_type in resolve_trigger_events(config) {
            let listener = outside_listener(
                self.host.weak_document(),
                element,
                Rc::clone(&excluded),
                Rc::clone(&callback),
            );
            let id = events.add_listener(event_type.clone(), listener);
            listeners.push((event_type, id));
        }

        tracing::debug!(
            ?element,
            triggers = ?listeners.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(),
            excluded = excluded.len(),
            "registered outside-click listeners"
        );

        let token = RegistrationToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.records.borrow_mut().insert(
            element,
            Registration {
                token,
                listeners,
                excluded,
            },
        );
        Some(token)
    }

    /// Remove the listeners installed for `element` and clear its marker
    ///
    /// Every listener recorded for the element is uninstalled by its token,
    /// including any registered under trigger types `config` no longer names.
    /// Returns false if the element was not registered.
    pub fn remove(&self, element: NodeId, config: &OutsideConfig) -> bool {
        let Some(record) = self.records.borrow_mut().remove(&element) else {
            tracing::trace!(?element, "remove on unregistered element, ignoring");
            return false;
        };

        let requested = resolve_trigger_events(config);
        self.uninstall(element, &record, &requested);
        true
    }

    /// Remove `element`'s registration only if it is the one `token` names
    ///
    /// Returns false, leaving any newer registration installed, when the
    /// element was re-registered or removed since `token` was issued.
    pub fn remove_with_token(
        &self,
        element: NodeId,
        token: RegistrationToken,
        config: &OutsideConfig,
    ) -> bool {
        let record = {
            let mut records = self.records.borrow_mut();
            if records.get(&element).is_some_and(|r| r.token == token) {
                records.remove(&element)
            } else {
                None
            }
        };
        let Some(record) = record else {
            tracing::trace!(?element, ?token, "registration token is stale, ignoring");
            return false;
        };

        let requested = resolve_trigger_events(config);
        self.uninstall(element, &record, &requested);
        true
    }

    /// Token of `element`'s current registration, if any
    pub fn registration_token(&self, element: NodeId) -> Option<RegistrationToken> {
        self.records.borrow().get(&element).map(|r| r.token)
    }

    fn uninstall(&self, element: NodeId, record: &Registration, requested: &[String]) {
        let events = self.host.events();
        for (event_type, id) in &record.listeners {
            if !requested.iter().any(|t| t == event_type) {
                tracing::debug!(
                    ?element,
                    event_type = %event_type,
                    "removing listener not named by the removal config"
                );
            }
            events.remove_listener(*id);
        }

        match self.host.shared_document().try_borrow_mut() {
            Ok(mut doc) => doc.clear_marker(element, REGISTERED_MARKER),
            Err(_) => tracing::warn!(?element, "document is borrowed, registered marker left set"),
        }

        tracing::debug!(
            ?element,
            listeners = record.listeners.len(),
            "removed outside-click listeners"
        );
    }

    /// Remove every registration, returning how many were removed
    pub fn clear(&self) -> usize {
        let records: Vec<(NodeId, Registration)> = self.records.borrow_mut().drain().collect();
        for (element, record) in &records {
            self.uninstall_recorded(*element, record);
        }
        records.len()
    }

    /// Remove registrations whose element no longer exists in the document
    ///
    /// Returns how many were removed. Skipped while the document is mutably
    /// borrowed.
    pub fn prune(&self) -> usize {
        let stale: Vec<NodeId> = {
            let Ok(doc) = self.host.shared_document().try_borrow() else {
                return 0;
            };
            self.records
                .borrow()
                .keys()
                .copied()
                .filter(|element| !doc.exists(*element))
                .collect()
        };

        for element in &stale {
            let record = self.records.borrow_mut().remove(element);
            if let Some(record) = record {
                self.uninstall_recorded(*element, &record);
            }
        }
        if !stale.is_empty() {
            tracing::debug!(pruned = stale.len(), "pruned registrations of removed elements");
        }
        stale.len()
    }

    fn uninstall_recorded(&self, element: NodeId, record: &Registration) {
        let requested: Vec<String> = record.listeners.iter().map(|(t, _)| t.clone()).collect();
        self.uninstall(element, record, &requested);
    }

    /// Check if `element` currently has listeners installed by this registry
    pub fn is_registered(&self, element: NodeId) -> bool {
        self.records.borrow().contains_key(&element)
    }

    /// Trigger event types installed for `element`, in order
    pub fn trigger_events(&self, element: NodeId) -> Vec<String> {
        self.records
            .borrow()
            .get(&element)
            .map(|r| r.listeners.iter().map(|(t, _)| t.clone()).collect())
            .unwrap_or_default()
    }

    /// Excluded nodes snapshotted when `element` was registered
    pub fn excluded_nodes(&self, element: NodeId) -> Vec<NodeId> {
        self.records
            .borrow()
            .get(&element)
            .map(|r| r.excluded.to_vec())
            .unwrap_or_default()
    }

    /// Number of registered elements
    pub fn registered_count(&self) -> usize {
        self.prune();
        self.records.borrow().len()
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        self.prune();
        let records = self.records.borrow();
        RegistryStats {
            registered: records.len(),
            listeners: records.values().map(|r| r.listeners.len()).sum(),
        }
    }
}

impl Drop for OutsideRegistry {
    fn drop(&mut self) {
        let removed = self.clear();
        if removed > 0 {
            tracing::debug!(removed, "outside registry dropped with live registrations");
        }
    }
}

/// Build the dispatcher listener for one (element, trigger type) pair
///
/// The document borrow ends before `callback` runs so the callback may
/// mutate the tree or remove registrations.
fn outside_listener(
    document: Weak<RefCell<Document>>,
    element: NodeId,
    excluded: Rc<[NodeId]>,
    callback: OutsideCallback,
) -> impl Fn(&Event) + 'static {
    move |event: &Event| {
        let outside = {
            let Some(document) = document.upgrade() else {
                return;
            };
            let Ok(doc) = document.try_borrow() else {
                tracing::warn!(?element, "document is mutably borrowed during dispatch, skipping");
                return;
            };
            if !doc.exists(element) {
                tracing::trace!(?element, "reference element no longer exists, skipping");
                return;
            }
            is_outside(event, &doc, element, &excluded)
        };

        tracing::trace!(
            ?element,
            event_type = %event.event_type,
            target = ?event.target,
            outside,
            "outside test"
        );

        if outside {
            callback(event);
        }
    }
}
