// rectnav_mesh: rectangle navigation mesh and A* search.
//
// A rectangular area starts as a uniform grid of linked cells. Each inserted
// axis-aligned obstacle carves its footprint out of the cells it overlaps:
// the overlapped cells are replaced by up to eight rectangles ringing the
// obstacle, and those are stitched back into the untouched surroundings.
// A* then runs over the resulting irregular adjacency graph.
//
// Module overview:
// - `types.rs`:       `NodeId` handles and the `NodeTag` render tag.
// - `rect.rs`:        Axis-aligned `Rect` and its geometric predicates.
// - `mesh.rs`:        `NavMesh`: node arena, grid init, obstacle insertion
//                     and subdivision, adjacency upkeep, invariant audit.
// - `pathfinding.rs`: A* over node adjacency.
// - `scatter.rs`:     Seeded obstacle placement with rejection resampling.
// - `snapshot.rs`:    Read-only view of nodes/obstacles/path for renderers.
// - `config.rs`:      `MeshConfig`: grid size, overlap policy, scatter ranges.
// - `error.rs`:       `MeshError` and the crate `Result` alias.
// - `prng`:           Re-exported from `rectnav_prng`.
//
// Nothing here draws, reads files, or touches global state: renderers and
// front ends read the mesh through accessors and `snapshot()`.
//
// **Critical constraint: the partition invariant.** After construction and
// after every completed `add_obstacle`, the live nodes tile the bounding
// area minus the obstacles without gaps or overlaps, and any two nodes that
// share a positive-length edge are linked. `NavMesh::check_invariants()`
// audits this.

pub mod config;
pub mod error;
pub mod mesh;
pub mod pathfinding;
pub use rectnav_prng as prng;
pub mod rect;
pub mod scatter;
pub mod snapshot;
pub mod types;
