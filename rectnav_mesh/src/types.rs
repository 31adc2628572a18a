// Small shared types: node handles and render tags.
//
// Nodes live in an arena owned by `NavMesh` (see `mesh.rs`) and are
// addressed by `NodeId`, the index of their arena slot. Slots are never
// reused, so a handle to a retired node stays dead instead of silently
// aliasing a newer node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in a `NavMesh` arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena slot index for this handle.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render tag carried by nodes and snapshot entries. The core only cares
/// whether a node is a search endpoint; renderers map tags to colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeTag {
    /// Ordinary traversable space.
    #[default]
    Free,
    Start,
    Goal,
    /// Used only for obstacle entries in snapshots.
    Obstacle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_index_and_display() {
        let id = NodeId(17);
        assert_eq!(id.index(), 17);
        assert_eq!(id.to_string(), "#17");
    }

    #[test]
    fn node_ids_order_by_slot() {
        assert!(NodeId(2) < NodeId(10));
    }

    #[test]
    fn default_tag_is_free() {
        assert_eq!(NodeTag::default(), NodeTag::Free);
    }
}
