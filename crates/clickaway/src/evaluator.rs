//! Outside test
//!
//! Decides, for one dispatched event, whether its origin lies outside the
//! reference element and every excluded node.

use clickaway_core::{Document, Event, NodeId};

/// Check whether `event` originated outside `element` and all `excluded` nodes
///
/// Events without a target are never outside.
pub fn is_outside(event: &Event, document: &Document, element: NodeId, excluded: &[NodeId]) -> bool {
    let Some(target) = event.target else {
        return false;
    };

    if document.contains(element, target) {
        return false;
    }

    !excluded.iter().any(|&node| document.contains(node, target))
}
