//! Component lifecycle binding
//!
//! Components opt into outside-click handling by implementing
//! [`ClickOutside`] and holding an [`OutsideBinding`]. The component calls
//! [`OutsideBinding::attach`] when it becomes active and
//! [`OutsideBinding::detach`] when it becomes inactive; dropping an attached
//! binding detaches it.
//!
//! A binding only ever removes the registration it created. If the element's
//! registration is removed through [`OutsideRegistry::remove`] directly, the
//! binding notices on its next `attach` and registers again.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use clickaway::prelude::*;
//!
//! struct Dropdown {
//!     open: Cell<bool>,
//! }
//!
//! impl ClickOutside for Dropdown {
//!     fn on_click_outside(&self, _event: &Event) {
//!         self.open.set(false);
//!     }
//! }
//!
//! let host = Host::new();
//! let root = host.document().root();
//! let menu = host.document_mut().append_element(root, "ul").unwrap();
//! let registry = Rc::new(OutsideRegistry::new(host.clone()));
//!
//! let dropdown = Rc::new(Dropdown { open: Cell::new(true) });
//! let binding = OutsideBinding::new(&registry, &dropdown, menu, OutsideConfig::new());
//!
//! binding.attach();
//! host.click(root);
//! assert!(!dropdown.open.get());
//!
//! binding.detach();
//! assert_eq!(host.events().listener_count(), 0);
//! ```

use std::cell::Cell;
use std::rc::{Rc, Weak};

use clickaway_core::{Event, NodeId};

use crate::config::OutsideConfig;
use crate::registry::{OutsideRegistry, RegistrationToken};

/// Implemented by components that react to outside events
pub trait ClickOutside: 'static {
    /// Called once per trigger event that lands outside the bound element
    fn on_click_outside(&self, event: &Event);
}

/// Ties a component's attach/detach transitions to outside-click registration
pub struct OutsideBinding<O: ClickOutside> {
    registry: Rc<OutsideRegistry>,
    owner: Weak<O>,
    element: NodeId,
    config: OutsideConfig,
    registration: Cell<Option<RegistrationToken>>,
}

impl<O: ClickOutside> std::fmt::Debug for OutsideBinding<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutsideBinding")
            .field("element", &self.element)
            .field("config", &self.config)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl<O: ClickOutside> OutsideBinding<O> {
    /// Create a detached binding for `owner` on `element`
    ///
    /// The owner is held weakly so the binding can live inside the component
    /// it is bound to (see [`Rc::new_cyclic`]).
    pub fn new(
        registry: &Rc<OutsideRegistry>,
        owner: &Rc<O>,
        element: NodeId,
        config: OutsideConfig,
    ) -> Self {
        Self::from_weak(registry, Rc::downgrade(owner), element, config)
    }

    /// Create a binding from a weak owner handle
    pub fn from_weak(
        registry: &Rc<OutsideRegistry>,
        owner: Weak<O>,
        element: NodeId,
        config: OutsideConfig,
    ) -> Self {
        Self {
            registry: Rc::clone(registry),
            owner,
            element,
            config,
            registration: Cell::new(None),
        }
    }

    /// Element this binding watches
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Configuration passed to the registry
    pub fn config(&self) -> &OutsideConfig {
        &self.config
    }

    /// Whether this binding currently owns the element's registration
    pub fn is_attached(&self) -> bool {
        self.registration
            .get()
            .is_some_and(|token| self.registry.registration_token(self.element) == Some(token))
    }

    /// Component became active: register the outside-click listeners
    ///
    /// Returns true only when this call installed listeners. Repeated calls
    /// while attached are no-ops.
    pub fn attach(&self) -> bool {
        if self.is_attached() {
            tracing::trace!(element = ?self.element, "binding already attached");
            return false;
        }
        if self.registration.take().is_some() {
            tracing::debug!(element = ?self.element, "registration was removed elsewhere, attaching again");
        }
        let Some(owner) = self.owner.upgrade() else {
            tracing::warn!(element = ?self.element, "cannot attach binding, owner dropped");
            return false;
        };

        let token = self.registry.register_with_token(
            &owner,
            self.element,
            O::on_click_outside,
            &self.config,
        );
        self.registration.set(token);
        token.is_some()
    }

    /// Component became inactive: remove the listeners this binding installed
    ///
    /// Leaves a registration created by someone else in place.
    pub fn detach(&self) -> bool {
        let Some(token) = self.registration.take() else {
            return false;
        };
        self.registry.remove_with_token(self.element, token, &self.config)
    }
}

impl<O: ClickOutside> Drop for OutsideBinding<O> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickaway_core::Host;
    use std::cell::RefCell;

    struct Modal {
        closes: Cell<usize>,
        binding: RefCell<Option<OutsideBinding<Modal>>>,
    }

    impl ClickOutside for Modal {
        fn on_click_outside(&self, _event: &Event) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    struct Fixture {
        host: Host,
        registry: Rc<OutsideRegistry>,
        dialog: NodeId,
        backdrop: NodeId,
    }

    fn fixture() -> Fixture {
        let host = Host::new();
        let (dialog, backdrop) = {
            let mut doc = host.document_mut();
            let root = doc.root();
            let backdrop = doc.append_element(root, "div").unwrap();
            let dialog = doc.append_element(backdrop, "dialog").unwrap();
            (dialog, backdrop)
        };
        let registry = Rc::new(OutsideRegistry::new(host.clone()));
        Fixture {
            host,
            registry,
            dialog,
            backdrop,
        }
    }

    fn modal() -> Rc<Modal> {
        Rc::new(Modal {
            closes: Cell::new(0),
            binding: RefCell::new(None),
        })
    }

    #[test]
    fn test_attach_detach_cycle() {
        let f = fixture();
        let modal = modal();
        let binding = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());

        assert!(binding.attach());
        assert!(binding.is_attached());
        f.host.click(f.backdrop);
        assert_eq!(modal.closes.get(), 1);

        assert!(binding.detach());
        assert!(!binding.is_attached());
        f.host.click(f.backdrop);
        assert_eq!(modal.closes.get(), 1);
        assert_eq!(f.host.events().listener_count(), 0);
    }

    #[test]
    fn test_repeated_attach_fires_once() {
        let f = fixture();
        let modal = modal();
        let binding = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());

        assert!(binding.attach());
        assert!(!binding.attach());
        assert!(!binding.attach());
        f.host.click(f.backdrop);

        assert_eq!(modal.closes.get(), 1);
        assert_eq!(f.host.events().listener_count(), 1);
    }

    #[test]
    fn test_detach_without_attach_is_noop() {
        let f = fixture();
        let modal = modal();
        let binding = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());

        assert!(!binding.detach());
        assert!(!binding.is_attached());
    }

    #[test]
    fn test_second_binding_does_not_steal_registration() {
        let f = fixture();
        let modal = modal();
        let first = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());
        let second = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());

        assert!(first.attach());
        assert!(!second.attach());
        assert!(!second.detach());
        drop(second);

        f.host.click(f.backdrop);
        assert_eq!(modal.closes.get(), 1);
    }

    #[test]
    fn test_drop_detaches() {
        let f = fixture();
        let modal = modal();
        {
            let binding =
                OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());
            binding.attach();
            assert_eq!(f.host.events().listener_count(), 1);
        }
        assert_eq!(f.host.events().listener_count(), 0);
        assert!(!f.registry.is_registered(f.dialog));
    }

    #[test]
    fn test_binding_owned_by_component() {
        let f = fixture();
        let modal = Rc::new_cyclic(|weak: &Weak<Modal>| Modal {
            closes: Cell::new(0),
            binding: RefCell::new(Some(OutsideBinding::from_weak(
                &f.registry,
                weak.clone(),
                f.dialog,
                OutsideConfig::new().with_trigger_events("click, keydown"),
            ))),
        });

        if let Some(binding) = modal.binding.borrow().as_ref() {
            assert!(binding.attach());
        }
        assert_eq!(f.host.events().listener_count(), 2);

        f.host.click(f.dialog);
        f.host.click(f.backdrop);
        assert_eq!(modal.closes.get(), 1);

        // Dropping the component drops its binding, which detaches
        drop(modal);
        assert_eq!(f.host.events().listener_count(), 0);
    }

    #[test]
    fn test_reattach_after_direct_remove() {
        let f = fixture();
        let modal = modal();
        let binding = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());

        assert!(binding.attach());
        assert!(f.registry.remove(f.dialog, &OutsideConfig::new()));
        assert!(!binding.is_attached());

        assert!(binding.attach());
        assert!(binding.is_attached());
        f.host.click(f.backdrop);
        assert_eq!(modal.closes.get(), 1);
    }

    #[test]
    fn test_stale_binding_leaves_newer_registration() {
        let f = fixture();
        let first_modal = modal();
        let second_modal = modal();
        let first =
            OutsideBinding::new(&f.registry, &first_modal, f.dialog, OutsideConfig::new());
        let second =
            OutsideBinding::new(&f.registry, &second_modal, f.dialog, OutsideConfig::new());

        assert!(first.attach());
        assert!(f.registry.remove(f.dialog, &OutsideConfig::new()));
        assert!(second.attach());
        assert!(!first.is_attached());

        assert!(!first.detach());
        drop(first);

        assert!(second.is_attached());
        assert!(f.registry.is_registered(f.dialog));
        assert_eq!(f.host.events().listener_count(), 1);
        f.host.click(f.backdrop);
        assert_eq!(second_modal.closes.get(), 1);
        assert_eq!(first_modal.closes.get(), 0);
    }

    #[test]
    fn test_attach_after_owner_dropped() {
        let f = fixture();
        let modal = modal();
        let binding = OutsideBinding::new(&f.registry, &modal, f.dialog, OutsideConfig::new());
        drop(modal);

        assert!(!binding.attach());
        assert_eq!(f.host.events().listener_count(), 0);
    }
}
