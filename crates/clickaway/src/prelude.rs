//! Common imports for outside-click handling
//!
//! ```rust
//! use clickaway::prelude::*;
//! ```

pub use crate::binding::{ClickOutside, OutsideBinding};
pub use crate::config::OutsideConfig;
pub use crate::registry::OutsideRegistry;

pub use clickaway_core::{event_types, Document, Event, Host, NodeId};
