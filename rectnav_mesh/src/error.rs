// Error types for the navigation mesh.
//
// Every fallible operation in the crate returns `Result<T>` with a
// `MeshError`. Geometric predicates never fail and stay plain `bool`s; only
// configuration, obstacle insertion, point queries, node handles and
// scattering can be rejected.
//
// See also: `config.rs` (`InvalidConfig`, `Json`), `mesh.rs` (insertion and
// handle errors), `scatter.rs` (`ScatterExhausted`).

use crate::types::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("obstacle has zero area ({w} x {h})")]
    DegenerateObstacle { w: f64, h: f64 },

    #[error("obstacle at ({x}, {y}) size {w} x {h} leaves the mesh bounds")]
    OutOfBounds { x: f64, y: f64, w: f64, h: f64 },

    #[error("obstacle overlaps existing obstacle {index}")]
    OverlapsObstacle { index: usize },

    #[error("point ({x}, {y}) is not inside any mesh node")]
    PointNotCovered { x: f64, y: f64 },

    #[error("node {0} is not part of the mesh")]
    UnknownNode(NodeId),

    #[error("scatter placed {placed} of {requested} obstacles before running out of attempts")]
    ScatterExhausted { placed: usize, requested: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MeshError>;
