// A* search over node adjacency.
//
// Step cost is the Euclidean distance between node centers; the heuristic is
// the Manhattan distance between centers. Manhattan overestimates diagonal
// steps, so the heuristic is not admissible and the result is not guaranteed
// to be the cheapest route. It is kept because route shape on existing maps
// depends on it.
//
// The open set is a `BinaryHeap` (min-heap via reversed ordering). Ties on
// `f` go to the node that entered the open set first, which is also the
// order a linear first-minimum scan would pick. Improving a node's `g`
// pushes a fresh heap entry that keeps the node's original entry order; the
// outdated entry is skipped when popped.
//
// A node is closed once expanded and is never reopened, even if a cheaper
// route to it shows up later.
//
// Search scratch (`g`, `f`, parent, open/closed flags) lives in `Vec`s
// indexed by `NodeId` slot and is allocated per call, so repeated searches
// on a long-lived mesh never see stale state, and the mesh is only read.
//
// See also: `mesh.rs` for `NavMesh::find_path`, which wraps this and keeps
// the last result.

use crate::mesh::NavMesh;
use crate::rect::Rect;
use crate::types::NodeId;
use log::trace;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Result of an A* search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Route from start to goal, both inclusive. Empty when start and goal
    /// are the same node or the goal is unreachable.
    pub nodes: Vec<NodeId>,
    /// Accumulated cost (`g`) at each entry of `nodes`.
    pub costs: Vec<f64>,
    /// Cost at the goal; 0 for an empty path.
    pub total_cost: f64,
    /// Nodes closed during the search.
    pub expanded: usize,
}

impl PathResult {
    /// True when there is no route to follow (unreachable goal, or start and
    /// goal already coincide).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Node centers along the route, for drawing a polyline.
    pub fn centers(&self, mesh: &NavMesh) -> Vec<(f64, f64)> {
        self.nodes
            .iter()
            .filter_map(|&id| mesh.node(id))
            .map(|n| n.rect.center())
            .collect()
    }
}

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    f: f64,
    /// When the node first entered the open set; breaks `f` ties.
    order: u64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: smallest (f, order) is "greatest" for the max-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.order.cmp(&self.order))
    }
}

fn heuristic(from: &Rect, goal: &Rect) -> f64 {
    from.manhattan_distance_to(goal)
}

/// Search for a route from `start` to `goal`.
///
/// Returns an empty result when `start == goal`, when either handle is not a
/// live node, or when the goal cannot be reached.
pub fn astar(mesh: &NavMesh, start: NodeId, goal: NodeId) -> PathResult {
    let (Some(start_node), Some(goal_node)) = (mesh.node(start), mesh.node(goal)) else {
        return PathResult::default();
    };
    if start == goal {
        return PathResult::default();
    }
    let goal_rect = goal_node.rect;

    let n = mesh.slot_count();
    let mut g = vec![0.0_f64; n];
    let mut parent: Vec<Option<NodeId>> = vec![None; n];
    let mut open_order: Vec<Option<u64>> = vec![None; n];
    let mut in_open = vec![false; n];
    let mut closed = vec![false; n];
    let mut next_order = 0u64;

    let si = start.index();
    open_order[si] = Some(next_order);
    next_order += 1;
    in_open[si] = true;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        f: heuristic(&start_node.rect, &goal_rect),
        order: 0,
        node: start,
    });
    let mut expanded = 0usize;

    while let Some(entry) = open.pop() {
        let current_id = entry.node;
        let ci = current_id.index();
        // A cheaper entry for this node was already expanded.
        if closed[ci] {
            continue;
        }

        if current_id == goal {
            trace!("astar {start} -> {goal}: reached after {expanded} expansions");
            return reconstruct_path(&parent, &g, goal, expanded);
        }

        in_open[ci] = false;
        closed[ci] = true;
        expanded += 1;

        let Some(current) = mesh.node(current_id) else {
            continue;
        };
        let current_g = g[ci];

        for &neighbor_id in current.neighbors() {
            let ni = neighbor_id.index();
            if closed[ni] {
                continue;
            }
            let Some(neighbor) = mesh.node(neighbor_id) else {
                continue;
            };
            let tentative_g = current_g + current.rect.distance_to(&neighbor.rect);
            if !in_open[ni] || tentative_g < g[ni] {
                parent[ni] = Some(current_id);
                g[ni] = tentative_g;
                let order = *open_order[ni].get_or_insert_with(|| {
                    let order = next_order;
                    next_order += 1;
                    order
                });
                in_open[ni] = true;
                open.push(OpenEntry {
                    f: tentative_g + heuristic(&neighbor.rect, &goal_rect),
                    order,
                    node: neighbor_id,
                });
            }
        }
    }

    trace!("astar {start} -> {goal}: unreachable after {expanded} expansions");
    PathResult {
        expanded,
        ..PathResult::default()
    }
}

/// Walk `parent` links back from the goal and return the route start-first.
fn reconstruct_path(
    parent: &[Option<NodeId>],
    g: &[f64],
    goal: NodeId,
    expanded: usize,
) -> PathResult {
    let mut nodes = vec![goal];
    let mut current = goal;
    while let Some(prev) = parent[current.index()] {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();
    let costs: Vec<f64> = nodes.iter().map(|id| g[id.index()]).collect();

    PathResult {
        total_cost: g[goal.index()],
        nodes,
        costs,
        expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshConfig;

    fn grid(side: u32) -> NavMesh {
        NavMesh::new(MeshConfig {
            map_side: side,
            ..MeshConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn same_node_gives_empty_path() {
        let mesh = grid(3);
        let result = astar(&mesh, NodeId(4), NodeId(4));
        assert!(result.is_empty());
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn neighbor_step() {
        let mesh = grid(3);
        let result = astar(&mesh, NodeId(0), NodeId(1));
        assert_eq!(result.nodes, vec![NodeId(0), NodeId(1)]);
        assert_eq!(result.costs, vec![0.0, 32.0]);
        assert_eq!(result.total_cost, 32.0);
    }

    #[test]
    fn diagonal_grid_route_uses_diagonals() {
        let mesh = grid(4);
        let result = astar(&mesh, NodeId(0), NodeId(15));
        assert_eq!(
            result.nodes,
            vec![NodeId(0), NodeId(5), NodeId(10), NodeId(15)]
        );
        let diag = 32.0_f64.hypot(32.0);
        assert!((result.total_cost - 3.0 * diag).abs() < 1e-9);
    }

    #[test]
    fn costs_never_decrease_along_route() {
        let mesh = grid(6);
        let result = astar(&mesh, NodeId(0), NodeId(35));
        assert_eq!(result.nodes.first(), Some(&NodeId(0)));
        assert_eq!(result.nodes.last(), Some(&NodeId(35)));
        for pair in result.costs.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        for pair in result.nodes.windows(2) {
            assert!(mesh.are_linked(pair[0], pair[1]));
        }
    }

    #[test]
    fn unknown_handles_give_empty_path() {
        let mesh = grid(2);
        assert!(astar(&mesh, NodeId(0), NodeId(50)).is_empty());
        assert!(astar(&mesh, NodeId(50), NodeId(0)).is_empty());
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let mut mesh = grid(3);
        // Wall off the right column completely.
        mesh.add_obstacle(Rect::new(32.0, 0.0, 32.0, 96.0)).unwrap();
        let start = mesh.node_at(10.0, 10.0).unwrap();
        let goal = mesh.node_at(80.0, 80.0).unwrap();
        let result = astar(&mesh, start, goal);
        assert!(result.is_empty());
        assert!(result.expanded > 0);
    }

    #[test]
    fn repeated_searches_agree() {
        let mut mesh = grid(5);
        mesh.add_obstacle(Rect::new(40.0, 20.0, 50.0, 70.0)).unwrap();
        let (start, goal) = mesh.pick_endpoints(None).unwrap();
        let first = astar(&mesh, start, goal);
        let second = astar(&mesh, start, goal);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn route_goes_around_obstacle() {
        let mut mesh = grid(5);
        mesh.add_obstacle(Rect::new(40.0, 0.0, 40.0, 130.0)).unwrap();
        let result = mesh
            .find_path_between_points((10.0, 10.0), (150.0, 10.0))
            .unwrap();
        assert!(!result.is_empty());
        let obstacle = mesh.obstacles()[0];
        for id in &result.nodes {
            assert!(!mesh.node(*id).unwrap().rect.intersects(&obstacle));
        }
        let centers = result.centers(&mesh);
        assert_eq!(centers.len(), result.len());
        assert_eq!(centers[0], (16.0, 16.0));
    }

    #[test]
    fn open_entry_orders_by_f_then_entry_order() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { f: 5.0, order: 2, node: NodeId(2) });
        heap.push(OpenEntry { f: 3.0, order: 1, node: NodeId(1) });
        heap.push(OpenEntry { f: 3.0, order: 0, node: NodeId(0) });
        let popped: Vec<NodeId> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(popped, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }
}
