//! Pixel space to projection space mapping
//!
//! World coordinates are 1-based pixel positions: `(1, 1)` is the centre of
//! the upper-left pixel and `(0.5, 0.5)` its outer corner. The upper-left
//! corner keywords give the projection coordinate of that outer corner.
//!
//! ```text
//! X = ULX + (world_x - 0.5) * res
//! Y = ULY - (world_y - 0.5) * res
//! ```

use cartos_core::{Group, Keyword};

/// Axis-aligned affine mapping between world (pixel) and projection
/// coordinates with a uniform pixel resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldMapper {
    resolution: f64,
    upper_left_x: f64,
    upper_left_y: f64,
}

impl WorldMapper {
    /// Create a mapper. `resolution` is in projection units per pixel.
    pub fn new(resolution: f64, upper_left_x: f64, upper_left_y: f64) -> Self {
        Self {
            resolution,
            upper_left_x,
            upper_left_y,
        }
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn upper_left_x(&self) -> f64 {
        self.upper_left_x
    }

    pub fn upper_left_y(&self) -> f64 {
        self.upper_left_y
    }

    /// Projection X of a world sample.
    pub fn projection_x(&self, world_x: f64) -> f64 {
        self.upper_left_x + (world_x - 0.5) * self.resolution
    }

    /// Projection Y of a world line.
    pub fn projection_y(&self, world_y: f64) -> f64 {
        self.upper_left_y - (world_y - 0.5) * self.resolution
    }

    /// World sample of a projection X.
    pub fn world_x(&self, projection_x: f64) -> f64 {
        (projection_x - self.upper_left_x) / self.resolution + 0.5
    }

    /// World line of a projection Y.
    pub fn world_y(&self, projection_y: f64) -> f64 {
        (self.upper_left_y - projection_y) / self.resolution + 0.5
    }

    /// Write the corner keywords into a mapping group.
    pub fn write_corner(&self, mapping: &mut Group) {
        mapping.set(Keyword::new("UpperLeftCornerX", self.upper_left_x).with_unit("meters"));
        mapping.set(Keyword::new("UpperLeftCornerY", self.upper_left_y).with_unit("meters"));
    }
}
