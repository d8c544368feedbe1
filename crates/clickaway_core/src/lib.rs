//! Clickaway Core
//!
//! Host-side primitives the outside-click engine runs against:
//!
//! - **Element Tree**: slotmap-backed [`Document`] with containment queries
//! - **Selectors**: CSS-like selector lists resolved against the tree
//! - **Event Dispatch**: the process-wide listener table with token-based removal
//! - **Host**: shared document + dispatcher bundle
//!
//! # Example
//!
//! ```rust
//! use clickaway_core::{event_types, Event, Host};
//!
//! let host = Host::new();
//! let root = host.document().root();
//! let panel = host.document_mut().append_element(root, "div").unwrap();
//!
//! let id = host.events().add_listener(event_types::CLICK, |event: &Event| {
//!     println!("click at {:?}", event.target);
//! });
//!
//! assert_eq!(host.click(panel), 1);
//! assert!(host.events().remove_listener(id));
//! ```

pub mod events;
pub mod host;
pub mod selector;
pub mod tree;

pub use events::{event_types, Event, EventDispatcher, Listener, ListenerId};
pub use host::{Host, SharedDocument};
pub use selector::{SelectorError, SelectorList};
pub use tree::{Document, NodeData, NodeId, TreeError};
