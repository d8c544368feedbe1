//! Clickaway
//!
//! Detects input events that land outside a UI element and invokes a
//! callback exactly once per qualifying event, so components can react to
//! "click outside" (closing a dropdown, dismissing a popover).
//!
//! - **Registry**: installs one listener per trigger event type, idempotently
//! - **Evaluator**: pure containment + exclusion test per event
//! - **Config**: `triggerEvents` / `exclude` options and their resolution
//! - **Binding**: attach/detach composition for component lifecycles
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
//! let (menu, toolbar, page) = {
//!     let mut doc = host.document_mut();
//!     let root = doc.root();
//!     let menu = doc.append_element(root, "ul").unwrap();
//!     let toolbar = doc.append_element(root, "div").unwrap();
//!     doc.set_id(toolbar, "toolbar").unwrap();
//!     let page = doc.append_element(root, "main").unwrap();
//!     (menu, toolbar, page)
//! };
//!
//! let registry = OutsideRegistry::new(host.clone());
//! let closed = Rc::new(Cell::new(0));
//!
//! let c = Rc::clone(&closed);
//! registry.register_fn(
//!     menu,
//!     move |_| c.set(c.get() + 1),
//!     &OutsideConfig::new().with_exclude("#toolbar"),
//! );
//!
//! host.click(toolbar);
//! host.click(page);
//! assert_eq!(closed.get(), 1);
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod prelude;
pub mod registry;

pub use binding::{ClickOutside, OutsideBinding};
pub use config::{
    resolve_excluded_nodes, resolve_trigger_events, OutsideConfig, DEFAULT_TRIGGER_EVENT,
};
pub use error::{ClickawayError, ConfigError, Result};
pub use evaluator::is_outside;
pub use registry::{
    OutsideCallback, OutsideRegistry, RegistrationToken, RegistryStats, REGISTERED_MARKER,
};

// Re-export the host primitives so most users only depend on this crate
pub use clickaway_core::{event_types, Document, Event, Host, NodeId};
