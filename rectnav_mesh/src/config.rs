// Mesh configuration.
//
// All tunable parameters live in `MeshConfig`, loadable from JSON. The mesh
// never uses magic numbers for its layout: grid resolution, how overlapping
// obstacles are treated, and the ranges the obstacle scatterer samples from
// are read from here. Missing JSON fields fall back to the defaults, which
// reproduce the classic 16 x 16 grid of 32-unit tiles.
//
// See also: `mesh.rs` which owns the `MeshConfig` for its lifetime,
// `scatter.rs` which reads `ScatterConfig`.

use crate::error::{MeshError, Result};
use crate::rect::Rect;
use serde::{Deserialize, Serialize};

/// What `NavMesh::add_obstacle` does with an obstacle that overlaps one
/// already in the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstaclePolicy {
    /// Refuse the insertion with `MeshError::OverlapsObstacle`.
    #[default]
    Reject,
    /// Carve the free part of the obstacle out of the mesh.
    Allow,
}

/// Sampling ranges for seeded obstacle placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// Number of obstacles to place. `None` means one per grid row
    /// (`map_side`).
    pub count: Option<u32>,
    /// Smallest obstacle side, in map units (inclusive).
    pub min_size: u32,
    /// Largest obstacle side, in tiles (exclusive).
    pub max_size_tiles: u32,
    /// Candidates drawn per obstacle before giving up on a disjoint spot.
    pub max_attempts_per_obstacle: u32,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            count: None,
            min_size: 8,
            max_size_tiles: 3,
            max_attempts_per_obstacle: 64,
        }
    }
}

/// Top-level mesh configuration. Never mutated once a mesh is built from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Width of one initial grid cell, in map units.
    pub tile_width: f64,
    /// Height of one initial grid cell, in map units.
    pub tile_height: f64,
    /// Cells per side of the square initial grid.
    pub map_side: u32,
    pub obstacle_policy: ObstaclePolicy,
    pub scatter: ScatterConfig,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            tile_width: 32.0,
            tile_height: 32.0,
            map_side: 16,
            obstacle_policy: ObstaclePolicy::Reject,
            scatter: ScatterConfig::default(),
        }
    }
}

impl MeshConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MeshConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn map_width(&self) -> f64 {
        self.map_side as f64 * self.tile_width
    }

    pub fn map_height(&self) -> f64 {
        self.map_side as f64 * self.tile_height
    }

    /// The area the mesh tessellates, anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.map_width(), self.map_height())
    }

    /// Number of obstacles `scatter_obstacles` places.
    pub fn scatter_count(&self) -> u32 {
        self.scatter.count.unwrap_or(self.map_side)
    }

    /// Exclusive upper bound on scattered obstacle width and height.
    pub fn scatter_max_extent(&self) -> (u64, u64) {
        let tiles = self.scatter.max_size_tiles as f64;
        (
            (tiles * self.tile_width).floor() as u64,
            (tiles * self.tile_height).floor() as u64,
        )
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.tile_width) && positive(self.tile_height)) {
            return Err(MeshError::InvalidConfig(format!(
                "tile size must be finite and positive, got {} x {}",
                self.tile_width, self.tile_height
            )));
        }
        if self.map_side == 0 {
            return Err(MeshError::InvalidConfig("map_side must be at least 1".into()));
        }
        // Finite tiles can still overflow once multiplied out to the map.
        if !(self.map_width().is_finite() && self.map_height().is_finite()) {
            return Err(MeshError::InvalidConfig(format!(
                "map extent {} x {} is not finite",
                self.map_width(),
                self.map_height()
            )));
        }
        Ok(())
    }

    /// Check the scatter ranges against the map. Only obstacle scattering
    /// needs these, so a mesh can be built from a config that fails here.
    pub fn validate_scatter(&self) -> Result<()> {
        let (max_w, max_h) = self.scatter_max_extent();
        let min = self.scatter.min_size as u64;
        if min == 0 || min >= max_w || min >= max_h {
            return Err(MeshError::InvalidConfig(format!(
                "scatter min_size {min} must be in [1, {})",
                max_w.min(max_h)
            )));
        }
        if max_w > self.map_width().floor() as u64 || max_h > self.map_height().floor() as u64 {
            return Err(MeshError::InvalidConfig(
                "scatter max_size_tiles exceeds the map".into(),
            ));
        }
        if self.scatter.max_attempts_per_obstacle == 0 {
            return Err(MeshError::InvalidConfig(
                "scatter max_attempts_per_obstacle must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MeshConfig::default();
        config.validate().unwrap();
        config.validate_scatter().unwrap();
        assert_eq!(config.map_width(), 512.0);
        assert_eq!(config.map_height(), 512.0);
        assert_eq!(config.scatter_count(), 16);
        assert_eq!(config.scatter_max_extent(), (96, 96));
    }

    #[test]
    fn default_config_serializes() {
        let config = MeshConfig::default();
        let json = config.to_json().unwrap();
        let restored = MeshConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = MeshConfig::from_json(r#"{ "map_side": 4, "obstacle_policy": "Allow" }"#)
            .unwrap();
        assert_eq!(config.map_side, 4);
        assert_eq!(config.tile_width, 32.0);
        assert_eq!(config.obstacle_policy, ObstaclePolicy::Allow);
        assert_eq!(config.scatter.min_size, 8);
        assert_eq!(config.scatter_count(), 4);
    }

    #[test]
    fn nested_scatter_fields_parse() {
        let config =
            MeshConfig::from_json(r#"{ "scatter": { "count": 3, "min_size": 4 } }"#).unwrap();
        assert_eq!(config.scatter_count(), 3);
        assert_eq!(config.scatter.min_size, 4);
        assert_eq!(config.scatter.max_size_tiles, 3);
    }

    #[test]
    fn rejects_non_positive_tiles() {
        let err = MeshConfig::from_json(r#"{ "tile_width": 0.0 }"#).unwrap_err();
        assert!(matches!(err, MeshError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_infinite_tiles() {
        let config = MeshConfig {
            tile_width: f64::INFINITY,
            ..MeshConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MeshError::InvalidConfig(_))
        ));
        let config = MeshConfig {
            tile_height: f64::NAN,
            ..MeshConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_tiles_that_overflow_the_map() {
        // 1e308 is finite, but 16 tiles of it is not.
        let err = MeshConfig::from_json(r#"{ "tile_width": 1e308 }"#).unwrap_err();
        assert!(matches!(err, MeshError::InvalidConfig(_)));

        let config = MeshConfig {
            tile_height: 1e308,
            ..MeshConfig::default()
        };
        assert!(config.tile_height.is_finite());
        assert!(!config.map_height().is_finite());
        assert!(crate::mesh::NavMesh::new(config).is_err());
    }

    #[test]
    fn rejects_zero_side() {
        let config = MeshConfig {
            map_side: 0,
            ..MeshConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn scatter_ranges_larger_than_map_only_fail_scatter_validation() {
        let config = MeshConfig {
            map_side: 2,
            ..MeshConfig::default()
        };
        config.validate().unwrap();
        assert!(matches!(
            config.validate_scatter(),
            Err(MeshError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_empty_scatter_size_range() {
        let mut config = MeshConfig::default();
        config.scatter.min_size = 96;
        assert!(config.validate_scatter().is_err());
        config.scatter.min_size = 95;
        config.validate_scatter().unwrap();
    }

    #[test]
    fn rejects_malformed_json() {
        let err = MeshConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MeshError::Json(_)));
    }
}
