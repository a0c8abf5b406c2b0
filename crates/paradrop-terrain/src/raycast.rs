//! Ray march against a terrain grid.
//!
//! Steps along a straight ray and compares its height with the terrain
//! below each sample. The first crossing is refined by bisection.

use glam::{DVec2, DVec3};

use crate::grid::TerrainGrid;

/// Upper bound on the march step (meters). Finer grids step at half a cell.
const MAX_STEP: f64 = 5.0;

/// Bisection iterations once a crossing is bracketed.
const REFINE_ITERATIONS: u32 = 24;

/// Ground height used outside the grid (sea level).
const OUTSIDE_ELEVATION: f64 = 0.0;

fn ground_height(grid: &TerrainGrid, p: DVec3) -> f64 {
    grid.elevation_at(DVec2::new(p.x, p.y))
        .unwrap_or(OUTSIDE_ELEVATION)
}

/// Find where the ray `origin + t * direction`, `0 <= t <= max_distance`,
/// first meets the ground.
///
/// `direction` need not be normalized but must be non-zero. Returns the
/// contact point with `z` set to the terrain height there, or None if the
/// ray stays above ground for its whole length.
pub fn first_impact(
    grid: &TerrainGrid,
    origin: DVec3,
    direction: DVec3,
    max_distance: f64,
) -> Option<DVec3> {
    let dir = direction.normalize_or_zero();
    if dir == DVec3::ZERO || max_distance.is_nan() || max_distance <= 0.0 {
        return None;
    }

    let above = |t: f64| {
        let p = origin + dir * t;
        p.z - ground_height(grid, p)
    };

    if above(0.0) <= 0.0 {
        // Already at or below the surface.
        return Some(DVec3::new(origin.x, origin.y, ground_height(grid, origin)));
    }

    let step = (grid.header.cell_size * 0.5).min(MAX_STEP);
    let num_steps = (max_distance / step).ceil().max(1.0) as usize;

    let mut prev_t = 0.0;
    for i in 1..=num_steps {
        let t = (i as f64 * step).min(max_distance);
        if above(t) <= 0.0 {
            let (mut lo, mut hi) = (prev_t, t);
            for _ in 0..REFINE_ITERATIONS {
                let mid = 0.5 * (lo + hi);
                if above(mid) <= 0.0 {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            let p = origin + dir * hi;
            return Some(DVec3::new(p.x, p.y, ground_height(grid, p)));
        }
        prev_t = t;
    }

    None
}
