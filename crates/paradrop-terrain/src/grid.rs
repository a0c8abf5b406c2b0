//! TerrainGrid: local heightmap with elevation and surface queries.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use paradrop_core::enums::SurfaceType;

/// Terrain grid header metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainHeader {
    /// Southwest corner of the grid in sim-space (meters).
    pub origin: DVec2,
    /// Distance between neighbouring samples (meters).
    pub cell_size: f64,
    /// Number of sample columns (west to east).
    pub width: u32,
    /// Number of sample rows (south to north).
    pub height: u32,
}

impl TerrainHeader {
    /// Northeast corner of the grid.
    pub fn far_corner(&self) -> DVec2 {
        self.origin
            + DVec2::new(
                (self.width.saturating_sub(1)) as f64 * self.cell_size,
                (self.height.saturating_sub(1)) as f64 * self.cell_size,
            )
    }

    fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Grid construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("Grid must be at least 2x2 samples, got {width}x{height}")]
    TooSmall { width: u32, height: u32 },

    #[error("Cell size must be positive, got {0}")]
    BadCellSize(f64),

    #[error("Expected {expected} samples, got {got}")]
    SizeMismatch { expected: usize, got: usize },
}

/// Loaded terrain heightmap with per-sample surface types.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    pub header: TerrainHeader,
    /// Elevation values in meters, row-major (south-to-north, west-to-east).
    elevations: Vec<f32>,
    /// Surface classification per sample, same layout as `elevations`.
    surfaces: Vec<SurfaceType>,
}

impl TerrainGrid {
    /// Create a TerrainGrid from pre-loaded data.
    pub fn new(
        header: TerrainHeader,
        elevations: Vec<f32>,
        surfaces: Vec<SurfaceType>,
    ) -> Result<Self, GridError> {
        if header.width < 2 || header.height < 2 {
            return Err(GridError::TooSmall {
                width: header.width,
                height: header.height,
            });
        }
        if header.cell_size <= 0.0 || !header.cell_size.is_finite() {
            return Err(GridError::BadCellSize(header.cell_size));
        }
        let expected = header.sample_count();
        for got in [elevations.len(), surfaces.len()] {
            if got != expected {
                return Err(GridError::SizeMismatch { expected, got });
            }
        }
        Ok(Self {
            header,
            elevations,
            surfaces,
        })
    }

    /// Build a grid by evaluating `f` at every sample position.
    pub fn from_fn(
        header: TerrainHeader,
        mut f: impl FnMut(DVec2) -> (f64, SurfaceType),
    ) -> Result<Self, GridError> {
        let n = header.sample_count();
        let mut elevations = Vec::with_capacity(n);
        let mut surfaces = Vec::with_capacity(n);
        for row in 0..header.height {
            for col in 0..header.width {
                let p = header.origin
                    + DVec2::new(col as f64 * header.cell_size, row as f64 * header.cell_size);
                let (elevation, surface) = f(p);
                elevations.push(elevation as f32);
                surfaces.push(surface);
            }
        }
        Self::new(header, elevations, surfaces)
    }

    /// Flat land at a constant elevation.
    pub fn flat(header: TerrainHeader, elevation: f64) -> Result<Self, GridError> {
        Self::from_fn(header, |_| (elevation, SurfaceType::Land))
    }

    /// Reclassify every sample inside the rectangle `[min, max]`.
    pub fn with_surface_rect(mut self, min: DVec2, max: DVec2, surface: SurfaceType) -> Self {
        let h = self.header;
        for row in 0..h.height {
            for col in 0..h.width {
                let p = h.origin + DVec2::new(col as f64 * h.cell_size, row as f64 * h.cell_size);
                if p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y {
                    self.surfaces[row as usize * h.width as usize + col as usize] = surface;
                }
            }
        }
        self
    }

    /// Mark the rectangle `[min, max]` as open water.
    pub fn with_water_rect(self, min: DVec2, max: DVec2) -> Self {
        self.with_surface_rect(min, max, SurfaceType::Water)
    }

    /// Whether a ground-plane point falls inside the grid.
    pub fn contains(&self, p: DVec2) -> bool {
        self.to_grid(p).is_some()
    }

    /// Convert a ground-plane position to fractional (row, col).
    /// Returns None if outside grid bounds.
    fn to_grid(&self, p: DVec2) -> Option<(f64, f64)> {
        let h = &self.header;
        let local = (p - h.origin) / h.cell_size;
        let (col, row) = (local.x, local.y);
        let max_col = (h.width - 1) as f64;
        let max_row = (h.height - 1) as f64;
        if !(0.0..=max_col).contains(&col) || !(0.0..=max_row).contains(&row) {
            return None;
        }
        Some((row, col))
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.header.width as usize + col
    }

    /// Elevation at a ground-plane position with bilinear interpolation.
    /// Returns None if the position is outside the grid.
    pub fn elevation_at(&self, p: DVec2) -> Option<f64> {
        let (row, col) = self.to_grid(p)?;
        Some(self.bilinear(row, col))
    }

    /// Bilinear interpolation at fractional row/col.
    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.header.height as usize - 1);
        let c1 = (c0 + 1).min(self.header.width as usize - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.elevations[self.index(r0, c0)] as f64;
        let e01 = self.elevations[self.index(r0, c1)] as f64;
        let e10 = self.elevations[self.index(r1, c0)] as f64;
        let e11 = self.elevations[self.index(r1, c1)] as f64;

        let south = e00 * (1.0 - fc) + e01 * fc;
        let north = e10 * (1.0 - fc) + e11 * fc;
        south * (1.0 - fr) + north * fr
    }

    /// Surface type of the nearest sample. None outside the grid.
    pub fn surface_at(&self, p: DVec2) -> Option<SurfaceType> {
        let (row, col) = self.to_grid(p)?;
        Some(self.surfaces[self.index(row.round() as usize, col.round() as usize)])
    }

    /// Terrain gradient magnitude (rise over run) around `p`, from central
    /// differences `offset` meters apart. None if any sample leaves the grid.
    pub fn slope_at(&self, p: DVec2, offset: f64) -> Option<f64> {
        let dx = DVec2::new(offset, 0.0);
        let dy = DVec2::new(0.0, offset);
        let gx = (self.elevation_at(p + dx)? - self.elevation_at(p - dx)?) / (2.0 * offset);
        let gy = (self.elevation_at(p + dy)? - self.elevation_at(p - dy)?) / (2.0 * offset);
        Some((gx * gx + gy * gy).sqrt())
    }

    /// Highest elevation anywhere in the grid.
    pub fn max_elevation(&self) -> f64 {
        self.elevations
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &e| acc.max(e as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u32, height: u32, cell_size: f64) -> TerrainHeader {
        TerrainHeader {
            origin: DVec2::new(-100.0, -100.0),
            cell_size,
            width,
            height,
        }
    }

    /// 5×5 grid with a 100 m peak in the middle and 50 m shoulders.
    fn make_peak_grid() -> TerrainGrid {
        #[rustfmt::skip]
        let elevations: Vec<f32> = vec![
            0.0,  0.0,   0.0,  0.0, 0.0,
            0.0, 50.0,  50.0, 50.0, 0.0,
            0.0, 50.0, 100.0, 50.0, 0.0,
            0.0, 50.0,  50.0, 50.0, 0.0,
            0.0,  0.0,   0.0,  0.0, 0.0,
        ];
        TerrainGrid::new(header(5, 5, 50.0), elevations, vec![SurfaceType::Land; 25]).unwrap()
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert_eq!(
            TerrainGrid::flat(header(1, 5, 10.0), 0.0).unwrap_err(),
            GridError::TooSmall { width: 1, height: 5 }
        );
        assert_eq!(
            TerrainGrid::flat(header(3, 3, 0.0), 0.0).unwrap_err(),
            GridError::BadCellSize(0.0)
        );
        assert_eq!(
            TerrainGrid::new(header(3, 3, 10.0), vec![0.0; 8], vec![SurfaceType::Land; 9])
                .unwrap_err(),
            GridError::SizeMismatch { expected: 9, got: 8 }
        );
    }

    #[test]
    fn test_elevation_at_samples_and_between() {
        let grid = make_peak_grid();
        // Center sample: origin + (2, 2) cells.
        assert!((grid.elevation_at(DVec2::new(0.0, 0.0)).unwrap() - 100.0).abs() < 1e-9);
        // Halfway between the peak and an east shoulder.
        assert!((grid.elevation_at(DVec2::new(25.0, 0.0)).unwrap() - 75.0).abs() < 1e-9);
        // Corner.
        assert_eq!(grid.elevation_at(DVec2::new(-100.0, -100.0)), Some(0.0));
    }

    #[test]
    fn test_outside_grid() {
        let grid = make_peak_grid();
        assert!(grid.elevation_at(DVec2::new(-100.1, 0.0)).is_none());
        assert!(grid.elevation_at(DVec2::new(0.0, 100.1)).is_none());
        assert!(grid.surface_at(DVec2::new(500.0, 0.0)).is_none());
        assert!(grid.contains(DVec2::new(100.0, 100.0)));
        assert_eq!(grid.header.far_corner(), DVec2::new(100.0, 100.0));
    }

    #[test]
    fn test_water_rect() {
        let grid = TerrainGrid::flat(header(21, 21, 10.0), 0.0)
            .unwrap()
            .with_water_rect(DVec2::new(0.0, 0.0), DVec2::new(100.0, 100.0));
        assert_eq!(grid.surface_at(DVec2::new(50.0, 50.0)), Some(SurfaceType::Water));
        assert_eq!(grid.surface_at(DVec2::new(-50.0, 50.0)), Some(SurfaceType::Land));
        // Nearest-sample rounding: 3 m inside the edge still reads water.
        assert_eq!(grid.surface_at(DVec2::new(-3.0, 50.0)), Some(SurfaceType::Water));
    }

    #[test]
    fn test_slope_of_ramp() {
        // Rises 1 m per 2 m eastward.
        let grid = TerrainGrid::from_fn(header(21, 21, 10.0), |p| {
            ((p.x + 100.0) * 0.5, SurfaceType::Land)
        })
        .unwrap();
        let slope = grid.slope_at(DVec2::new(0.0, 0.0), 2.0).unwrap();
        assert!((slope - 0.5).abs() < 1e-6);
        assert!(grid.slope_at(DVec2::new(-99.0, 0.0), 2.0).is_none());
        assert!((grid.max_elevation() - 100.0).abs() < 1e-6);
    }
}
