// Seeded obstacle placement.
//
// Draws integer-aligned obstacle rectangles from `ScatterConfig`'s ranges
// and inserts them into a mesh, drawing a fresh candidate whenever the mesh
// rejects one for overlapping an earlier obstacle. With
// `ObstaclePolicy::Allow` every candidate is accepted on the first draw.
//
// See also: `config.rs` for the sampling ranges, `rectnav_prng` for the
// generator.
//
// **Critical constraint: reproducibility.** The same config and seed always
// place the same obstacles in the same order.

use crate::config::MeshConfig;
use crate::error::{MeshError, Result};
use crate::mesh::NavMesh;
use crate::prng::MeshRng;
use crate::rect::Rect;
use log::{debug, warn};

/// Outcome of `scatter_obstacles`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterReport {
    /// Obstacles inserted, in insertion order.
    pub placed: Vec<Rect>,
    /// Candidates drawn, including rejected ones.
    pub attempts: u32,
}

/// Draw one candidate obstacle. Sides fall in
/// `[min_size, max_size_tiles * tile)` and the rectangle lies inside the map.
///
/// The config must pass `MeshConfig::validate_scatter`.
pub fn sample_obstacle(config: &MeshConfig, rng: &mut MeshRng) -> Rect {
    let (max_w, max_h) = config.scatter_max_extent();
    let min = config.scatter.min_size as u64;
    let map_w = config.map_width().floor() as u64;
    let map_h = config.map_height().floor() as u64;

    let w = rng.range_u64(min, max_w);
    let h = rng.range_u64(min, max_h);
    let x = rng.range_u64(0, map_w - w);
    let y = rng.range_u64(0, map_h - h);
    Rect::new(x as f64, y as f64, w as f64, h as f64)
}

/// Insert `config.scatter_count()` obstacles drawn from `rng`.
///
/// Fails with `ScatterExhausted` if some obstacle finds no free spot within
/// `max_attempts_per_obstacle` draws; obstacles placed before that stay in
/// the mesh.
pub fn scatter_obstacles(mesh: &mut NavMesh, rng: &mut MeshRng) -> Result<ScatterReport> {
    let config = mesh.config().clone();
    config.validate_scatter()?;

    let requested = config.scatter_count() as usize;
    let mut placed = Vec::with_capacity(requested);
    let mut attempts = 0u32;

    for _ in 0..requested {
        let mut inserted = false;
        for _ in 0..config.scatter.max_attempts_per_obstacle {
            attempts += 1;
            let candidate = sample_obstacle(&config, rng);
            match mesh.add_obstacle(candidate) {
                Ok(_) => {
                    placed.push(candidate);
                    inserted = true;
                    break;
                }
                Err(MeshError::OverlapsObstacle { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        if !inserted {
            warn!(
                "scatter gave up after {} draws: placed {} of {requested}",
                config.scatter.max_attempts_per_obstacle,
                placed.len()
            );
            return Err(MeshError::ScatterExhausted {
                placed: placed.len(),
                requested,
            });
        }
    }

    debug!(
        "scattered {} obstacles in {attempts} draws, {} nodes live",
        placed.len(),
        mesh.node_count()
    );
    Ok(ScatterReport { placed, attempts })
}
