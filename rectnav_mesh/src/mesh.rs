// The navigation mesh: a tessellation of free space into linked rectangles.
//
// `NavMesh` owns every `Node` in an append-only arena (`Vec<Option<Node>>`
// indexed by `NodeId`) plus the list of inserted obstacles. Adjacency is a
// small list of `NodeId`s on each node; `link`/`unlink` always edit both
// endpoints, so links are symmetric by construction.
//
// Lifecycle:
// 1. `NavMesh::new` lays down a uniform `map_side x map_side` grid. Each cell
//    links to its west, north-west, north and north-east predecessors; the
//    other four directions arrive when later cells link back.
// 2. `add_obstacle` validates the obstacle, then `subdivide` replaces every
//    node it overlaps with ring pieces (see below) and retires the old nodes.
// 3. `find_path` runs A* (`pathfinding.rs`) and keeps the last result for
//    renderers.
//
// Ring subdivision. Around a hole `H` inside an outer rectangle `B`, the free
// space `B \ H` is split into eight pieces:
//
//     nw | n | ne
//     ---+---+---
//     w  | H | e
//     ---+---+---
//     sw | s | se
//
// Pieces with zero width or height (hole flush with an outer edge) are
// dropped. When the overlapped nodes exactly tile their bounding box, one
// ring is cut from that box (`Strategy::MergedRing`), coarsening the area
// around the obstacle. When they do not (an L-shaped union left by earlier
// insertions, or a hole already partly covered by an overlapping obstacle)
// each overlapped node gets its own ring around its share of the obstacle
// (`Strategy::PerNodeRing`). Either way the new pieces are then linked to
// every untouched neighbor of the node(s) they replace that they touch.
//
// Slots are never reused, so `NodeId`s of retired nodes stay invalid and the
// A* scratch arrays in `pathfinding.rs` can be sized by `slot_count()`.
//
// See also: `rect.rs` for the geometric predicates, `pathfinding.rs` for the
// search, `snapshot.rs` for the renderer-facing export.

use crate::config::{MeshConfig, ObstaclePolicy};
use crate::error::{MeshError, Result};
use crate::pathfinding::{self, PathResult};
use crate::prng::MeshRng;
use crate::rect::{GEOM_EPSILON, Rect, union_area};
use crate::types::{NodeId, NodeTag};
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A rectangle of free space and its adjacency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub rect: Rect,
    pub tag: NodeTag,
    neighbors: SmallVec<[NodeId; 8]>,
}

impl Node {
    /// Linked nodes, in link order.
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn is_linked(&self, other: NodeId) -> bool {
        self.neighbors.contains(&other)
    }
}

/// How an insertion retessellated the space around an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// The obstacle covered no node (only possible with
    /// `ObstaclePolicy::Allow`, inside an earlier obstacle).
    Untouched,
    /// One ring around the obstacle, cut from the bounding box of the
    /// overlapped nodes.
    MergedRing,
    /// One ring per overlapped node.
    PerNodeRing,
}

/// Summary of one `add_obstacle` call.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertReport {
    /// Index of the obstacle in `NavMesh::obstacles()`.
    pub obstacle_index: usize,
    pub strategy: Strategy,
    /// Nodes that overlapped the obstacle and were retired.
    pub retired: Vec<NodeId>,
    /// Ring pieces committed to the mesh.
    pub created: Vec<NodeId>,
}

/// A broken mesh invariant, as reported by `NavMesh::check_invariants`.
#[derive(Clone, Debug, PartialEq)]
pub enum InvariantViolation {
    Degenerate(NodeId),
    OutOfBounds(NodeId),
    SelfLink(NodeId),
    DanglingLink(NodeId, NodeId),
    AsymmetricLink(NodeId, NodeId),
    /// Linked nodes whose closed rectangles do not even share a corner.
    LinkWithoutContact(NodeId, NodeId),
    Overlap(NodeId, NodeId),
    UnlinkedTouch(NodeId, NodeId),
    CoversObstacle(NodeId, usize),
    /// Node area does not add up to the free area of the bounds.
    AreaMismatch { free: f64, covered: f64 },
}

/// Ring piece slots, in the order `ring_pieces` returns them.
const NW: usize = 0;
const N: usize = 1;
const NE: usize = 2;
const W: usize = 3;
const E: usize = 4;
const SW: usize = 5;
const S: usize = 6;
const SE: usize = 7;

/// Edge pieces link to the two corner pieces they share an edge with.
/// Corners never touch each other, nor do opposite edges.
const RING_LINKS: [(usize, usize); 8] = [
    (W, NW),
    (W, SW),
    (E, NE),
    (E, SE),
    (N, NW),
    (N, NE),
    (S, SW),
    (S, SE),
];

/// Split `outer \ hole` into the eight ring pieces. `hole` must lie inside
/// `outer` (callers pass `outer ∩ obstacle`); pieces may be degenerate.
fn ring_pieces(outer: &Rect, hole: &Rect) -> [Rect; 8] {
    let (x0, y0, x1, y1) = (outer.x, outer.y, outer.right(), outer.bottom());
    let (hx0, hy0, hx1, hy1) = (hole.x, hole.y, hole.right(), hole.bottom());

    let mut pieces = [Rect::default(); 8];
    pieces[NW] = Rect::from_corners(x0, y0, hx0, hy0);
    pieces[N] = Rect::from_corners(hx0, y0, hx1, hy0);
    pieces[NE] = Rect::from_corners(hx1, y0, x1, hy0);
    pieces[W] = Rect::from_corners(x0, hy0, hx0, hy1);
    pieces[E] = Rect::from_corners(hx1, hy0, x1, hy1);
    pieces[SW] = Rect::from_corners(x0, hy1, hx0, y1);
    pieces[S] = Rect::from_corners(hx0, hy1, hx1, y1);
    pieces[SE] = Rect::from_corners(hx1, hy1, x1, y1);
    pieces
}

#[derive(Clone, Debug)]
pub struct NavMesh {
    config: MeshConfig,
    bounds: Rect,
    slots: Vec<Option<Node>>,
    live: usize,
    obstacles: Vec<Rect>,
    last_path: PathResult,
}

impl NavMesh {
    /// Build the initial uniform grid for `config`.
    pub fn new(config: MeshConfig) -> Result<Self> {
        config.validate()?;
        let mut mesh = Self {
            bounds: config.bounds(),
            config,
            slots: Vec::new(),
            live: 0,
            obstacles: Vec::new(),
            last_path: PathResult::default(),
        };
        mesh.init_grid();
        Ok(mesh)
    }

    /// Throw away all obstacles, nodes and the last path, and lay down a
    /// fresh grid.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.live = 0;
        self.obstacles.clear();
        self.last_path = PathResult::default();
        self.init_grid();
    }

    fn init_grid(&mut self) {
        let side = self.config.map_side as usize;
        let (tw, th) = (self.config.tile_width, self.config.tile_height);
        for row in 0..side {
            for col in 0..side {
                let id = self.add_node(Rect::new(col as f64 * tw, row as f64 * th, tw, th));
                // Grid cells occupy slots row-major, so slot arithmetic finds
                // the earlier neighbors.
                let i = id.index();
                if col > 0 {
                    self.link(id, NodeId((i - 1) as u32));
                }
                if row > 0 {
                    if col > 0 {
                        self.link(id, NodeId((i - side - 1) as u32));
                    }
                    self.link(id, NodeId((i - side) as u32));
                    if col + 1 < side {
                        self.link(id, NodeId((i - side + 1) as u32));
                    }
                }
            }
        }
        debug!("grid initialized: {side}x{side} cells of {tw}x{th}");
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Live node by handle, `None` for retired or unknown handles.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(MeshError::UnknownNode(id))
    }

    /// Live nodes in arena order (grid cells row-major, then ring pieces in
    /// creation order).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().flatten()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Upper bound on `NodeId::index()` for any handle this mesh issued.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Inserted obstacles in insertion order.
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    /// The most recent `find_path` result (empty before any search).
    pub fn last_path(&self) -> &PathResult {
        &self.last_path
    }

    pub fn are_linked(&self, a: NodeId, b: NodeId) -> bool {
        self.node(a).is_some_and(|n| n.is_linked(b))
    }

    /// Live nodes whose interior overlaps `area`, in arena order.
    pub fn find_nodes(&self, area: &Rect) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.rect.intersects(area))
            .map(|n| n.id)
            .collect()
    }

    /// The node whose interior contains `(x, y)`. Points on node
    /// boundaries, inside obstacles, or outside the bounds resolve to
    /// `None`.
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.nodes()
            .find(|n| n.rect.contains_point(x, y))
            .map(|n| n.id)
    }

    // -----------------------------------------------------------------------
    // Topology primitives
    // -----------------------------------------------------------------------

    fn add_node(&mut self, rect: Rect) -> NodeId {
        debug_assert!(!rect.is_degenerate(), "degenerate node {rect:?}");
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Node {
            id,
            rect,
            tag: NodeTag::Free,
            neighbors: SmallVec::new(),
        }));
        self.live += 1;
        id
    }

    /// Link two live nodes both ways. Linking a node to itself, to a dead
    /// handle, or to a node it is already linked to does nothing.
    fn link(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.node(a).is_none() || self.node(b).is_none() || self.are_linked(a, b) {
            return;
        }
        if let Some(Some(node)) = self.slots.get_mut(a.index()) {
            node.neighbors.push(b);
        }
        if let Some(Some(node)) = self.slots.get_mut(b.index()) {
            node.neighbors.push(a);
        }
    }

    fn unlink(&mut self, a: NodeId, b: NodeId) {
        if let Some(Some(node)) = self.slots.get_mut(a.index()) {
            node.neighbors.retain(|n| *n != b);
        }
        if let Some(Some(node)) = self.slots.get_mut(b.index()) {
            node.neighbors.retain(|n| *n != a);
        }
    }

    /// Unlink `id` from all its neighbors.
    fn detach(&mut self, id: NodeId) {
        let neighbors: SmallVec<[NodeId; 8]> = match self.node(id) {
            Some(node) => node.neighbors.clone(),
            None => return,
        };
        for other in neighbors {
            self.unlink(id, other);
        }
    }

    fn remove_node(&mut self, id: NodeId) {
        self.detach(id);
        if let Some(slot) = self.slots.get_mut(id.index()) {
            if slot.take().is_some() {
                self.live -= 1;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Obstacle insertion
    // -----------------------------------------------------------------------

    /// Insert an obstacle and retessellate the free space around it.
    ///
    /// The obstacle must have positive size and lie within the bounds. Under
    /// `ObstaclePolicy::Reject` it must also be disjoint from every earlier
    /// obstacle; a rejected obstacle leaves the mesh untouched.
    pub fn add_obstacle(&mut self, obstacle: Rect) -> Result<InsertReport> {
        if obstacle.is_degenerate() {
            return Err(MeshError::DegenerateObstacle {
                w: obstacle.w,
                h: obstacle.h,
            });
        }
        if !self.bounds.contains(&obstacle) {
            return Err(MeshError::OutOfBounds {
                x: obstacle.x,
                y: obstacle.y,
                w: obstacle.w,
                h: obstacle.h,
            });
        }
        if self.config.obstacle_policy == ObstaclePolicy::Reject {
            if let Some(index) = self.obstacles.iter().position(|o| o.intersects(&obstacle)) {
                return Err(MeshError::OverlapsObstacle { index });
            }
        }

        let obstacle_index = self.obstacles.len();
        self.obstacles.push(obstacle);
        let report = self.subdivide(obstacle_index, &obstacle);
        debug!(
            "obstacle {obstacle_index} at ({}, {}) {}x{}: {:?}, retired {}, created {}, {} nodes live",
            obstacle.x,
            obstacle.y,
            obstacle.w,
            obstacle.h,
            report.strategy,
            report.retired.len(),
            report.created.len(),
            self.live,
        );
        Ok(report)
    }

    fn subdivide(&mut self, obstacle_index: usize, obstacle: &Rect) -> InsertReport {
        // 1. Nodes overlapping the obstacle, in arena (= ascending id) order.
        let affected = self.find_nodes(obstacle);
        let affected_rects: Vec<Rect> = affected
            .iter()
            .filter_map(|&id| self.node(id).map(|n| n.rect))
            .collect();

        // 2. Their bounding box, and whether they tile it.
        let Some(bbox) = Rect::bounding(&affected_rects) else {
            return InsertReport {
                obstacle_index,
                strategy: Strategy::Untouched,
                retired: Vec::new(),
                created: Vec::new(),
            };
        };
        let covered: f64 = affected_rects.iter().map(Rect::area).sum();
        let tiles_bbox = (bbox.area() - covered).abs() <= GEOM_EPSILON * bbox.area().max(1.0);
        let strategy = if tiles_bbox {
            Strategy::MergedRing
        } else {
            Strategy::PerNodeRing
        };

        // 3 + 4. Cut the ring(s), keep non-degenerate pieces, link each ring
        // internally.
        let outers: Vec<Rect> = match strategy {
            Strategy::MergedRing => vec![bbox],
            _ => affected_rects.clone(),
        };
        let mut rings: Vec<Vec<NodeId>> = Vec::with_capacity(outers.len());
        for outer in &outers {
            // Every outer overlaps the obstacle: it is an affected node or
            // their bounding box.
            let Some(hole) = outer.intersection(obstacle) else {
                continue;
            };
            let pieces = ring_pieces(outer, &hole);
            let mut slots: [Option<NodeId>; 8] = [None; 8];
            for (slot, piece) in slots.iter_mut().zip(pieces.iter()) {
                if !piece.is_degenerate() {
                    *slot = Some(self.add_node(*piece));
                }
            }
            for &(a, b) in &RING_LINKS {
                if let (Some(a), Some(b)) = (slots[a], slots[b]) {
                    self.link(a, b);
                }
            }
            rings.push(slots.into_iter().flatten().collect());
        }

        // Pieces of neighboring per-node rings abut each other.
        for (i, ring) in rings.iter().enumerate() {
            for other in &rings[i + 1..] {
                for &a in ring {
                    for &b in other {
                        if self.touch(a, b) {
                            self.link(a, b);
                        }
                    }
                }
            }
        }
        let created: Vec<NodeId> = rings.concat();

        // 5. Thread the new pieces into the untouched surroundings: a piece
        // occupying part of an old node can only touch that node's exterior
        // neighbors.
        for (&old, old_rect) in affected.iter().zip(&affected_rects) {
            let exterior: Vec<NodeId> = match self.node(old) {
                Some(node) => node
                    .neighbors
                    .iter()
                    .copied()
                    .filter(|n| affected.binary_search(n).is_err())
                    .collect(),
                None => continue,
            };
            for &piece in &created {
                let overlaps = self
                    .node(piece)
                    .is_some_and(|p| p.rect.intersects(old_rect));
                if !overlaps {
                    continue;
                }
                for &outside in &exterior {
                    if self.touch(piece, outside) {
                        self.link(piece, outside);
                    }
                }
            }
        }

        // 6. Retire the overlapped nodes. (7. The pieces were committed to the
        // arena as they were cut.)
        for &old in &affected {
            self.remove_node(old);
        }

        InsertReport {
            obstacle_index,
            strategy,
            retired: affected,
            created,
        }
    }

    fn touch(&self, a: NodeId, b: NodeId) -> bool {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => a.rect.touches(&b.rect),
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Run A* between two nodes and remember the result as `last_path`.
    pub fn find_path(&mut self, start: NodeId, goal: NodeId) -> Result<PathResult> {
        self.try_node(start)?;
        self.try_node(goal)?;
        let result = pathfinding::astar(self, start, goal);
        self.last_path = result.clone();
        Ok(result)
    }

    /// Resolve two points to their covering nodes and run `find_path`.
    /// Both points in the same node yields an empty path.
    pub fn find_path_between_points(
        &mut self,
        start: (f64, f64),
        goal: (f64, f64),
    ) -> Result<PathResult> {
        let start_id = self.node_at(start.0, start.1).ok_or(MeshError::PointNotCovered {
            x: start.0,
            y: start.1,
        })?;
        let goal_id = self.node_at(goal.0, goal.1).ok_or(MeshError::PointNotCovered {
            x: goal.0,
            y: goal.1,
        })?;
        self.find_path(start_id, goal_id)
    }

    /// Tag `start` and `goal` for rendering, clearing earlier endpoint tags.
    pub fn mark_endpoints(&mut self, start: NodeId, goal: NodeId) -> Result<()> {
        self.try_node(start)?;
        self.try_node(goal)?;
        for node in self.slots.iter_mut().flatten() {
            node.tag = NodeTag::Free;
        }
        if let Some(Some(node)) = self.slots.get_mut(start.index()) {
            node.tag = NodeTag::Start;
        }
        if let Some(Some(node)) = self.slots.get_mut(goal.index()) {
            node.tag = NodeTag::Goal;
        }
        Ok(())
    }

    /// Choose search endpoints: the first and last live node, or two random
    /// live nodes when `rng` is given. `None` when the mesh has no nodes.
    pub fn pick_endpoints(&self, rng: Option<&mut MeshRng>) -> Option<(NodeId, NodeId)> {
        let ids = self.node_ids();
        if ids.is_empty() {
            return None;
        }
        match rng {
            Some(rng) => {
                let start = ids[rng.range_usize(0, ids.len())];
                let goal = ids[rng.range_usize(0, ids.len())];
                Some((start, goal))
            }
            None => Some((ids[0], ids[ids.len() - 1])),
        }
    }

    // -----------------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------------

    /// Check the partition and adjacency invariants. Returns every violation
    /// found; an empty list means the mesh is consistent. Quadratic in the
    /// node count.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let nodes: Vec<&Node> = self.nodes().collect();

        for node in &nodes {
            if node.rect.is_degenerate() {
                violations.push(InvariantViolation::Degenerate(node.id));
            }
            if !self.bounds.contains(&node.rect) {
                violations.push(InvariantViolation::OutOfBounds(node.id));
            }
            for (index, obstacle) in self.obstacles.iter().enumerate() {
                if node.rect.intersects(obstacle) {
                    violations.push(InvariantViolation::CoversObstacle(node.id, index));
                }
            }
            for &other in node.neighbors() {
                if other == node.id {
                    violations.push(InvariantViolation::SelfLink(node.id));
                    continue;
                }
                match self.node(other) {
                    None => violations.push(InvariantViolation::DanglingLink(node.id, other)),
                    Some(peer) => {
                        if !peer.is_linked(node.id) {
                            violations.push(InvariantViolation::AsymmetricLink(node.id, other));
                        }
                        if node.id < other && !node.rect.meets(&peer.rect) {
                            violations
                                .push(InvariantViolation::LinkWithoutContact(node.id, other));
                        }
                    }
                }
            }
        }

        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                if a.rect.intersects(&b.rect) {
                    violations.push(InvariantViolation::Overlap(a.id, b.id));
                } else if a.rect.touches(&b.rect) && !a.is_linked(b.id) {
                    violations.push(InvariantViolation::UnlinkedTouch(a.id, b.id));
                }
            }
        }

        let free = self.bounds.area() - union_area(&self.obstacles);
        let covered: f64 = nodes.iter().map(|n| n.rect.area()).sum();
        if (free - covered).abs() > 1e-6 * self.bounds.area().max(1.0) {
            violations.push(InvariantViolation::AreaMismatch { free, covered });
        }

        violations
    }
}
