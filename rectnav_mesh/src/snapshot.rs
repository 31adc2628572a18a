// Read-only export of mesh state for renderers.
//
// A renderer needs node rectangles and tags, adjacency (to draw edges),
// obstacle rectangles and the last path. `MeshSnapshot` copies exactly that
// out of a `NavMesh` so drawing code never holds a borrow of the mesh and
// never mutates it. The JSON form is a one-way export for external viewers.

use crate::error::Result;
use crate::mesh::NavMesh;
use crate::rect::Rect;
use crate::types::{NodeId, NodeTag};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub tag: NodeTag,
    pub neighbors: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObstacleView {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub tag: NodeTag,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeshSnapshot {
    pub bounds: Rect,
    pub nodes: Vec<NodeView>,
    pub obstacles: Vec<ObstacleView>,
    /// Last path, start first.
    pub path: Vec<NodeId>,
    /// Centers of the path nodes, for drawing the route as a polyline.
    pub path_points: Vec<(f64, f64)>,
}

impl MeshSnapshot {
    pub fn capture(mesh: &NavMesh) -> Self {
        let nodes = mesh
            .nodes()
            .map(|n| NodeView {
                id: n.id,
                x: n.rect.x,
                y: n.rect.y,
                w: n.rect.w,
                h: n.rect.h,
                tag: n.tag,
                neighbors: n.neighbors().to_vec(),
            })
            .collect();
        let obstacles = mesh
            .obstacles()
            .iter()
            .map(|o| ObstacleView {
                x: o.x,
                y: o.y,
                w: o.w,
                h: o.h,
                tag: NodeTag::Obstacle,
            })
            .collect();
        let path = mesh.last_path();
        Self {
            bounds: mesh.bounds(),
            nodes,
            obstacles,
            path: path.nodes.clone(),
            path_points: path.centers(mesh),
        }
    }

    /// Each adjacency once, as `(lower id, higher id)`.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .nodes
            .iter()
            .flat_map(|n| {
                n.neighbors
                    .iter()
                    .filter(move |&&other| n.id < other)
                    .map(move |&other| (n.id, other))
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl NavMesh {
    /// Copy out everything a renderer reads.
    pub fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot::capture(self)
    }
}
