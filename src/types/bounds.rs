//! Axis-aligned rectangles in world coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `[x_min, x_max] × [y_min, y_max]`.
///
/// Used for friction blocks, patch extents, raster extents and
/// forced-refinement regions.
///
/// # Example
///
/// ```
/// use landspill::types::Bounds2D;
///
/// let block = Bounds2D::new(0.0, 20.0, 0.0, 10.0);
///
/// assert_eq!(block.width(), 20.0);
/// assert_eq!(block.area(), 200.0);
/// assert!(block.contains(20.0, 10.0));
/// assert!(!block.contains_half_open(20.0, 10.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds2D {
    /// Minimum x-coordinate (western edge)
    pub x_min: f64,
    /// Maximum x-coordinate (eastern edge)
    pub x_max: f64,
    /// Minimum y-coordinate (southern edge)
    pub y_min: f64,
    /// Maximum y-coordinate (northern edge)
    pub y_max: f64,
}

impl Bounds2D {
    /// Create new bounds.
    ///
    /// # Panics
    ///
    /// Panics if `x_max <= x_min` or `y_max <= y_min`. Use [`Bounds2D::try_new`]
    /// for user-supplied extents.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        assert!(
            x_max > x_min,
            "x_max ({}) must be greater than x_min ({})",
            x_max,
            x_min
        );
        assert!(
            y_max > y_min,
            "y_max ({}) must be greater than y_min ({})",
            y_max,
            y_min
        );

        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Create bounds, returning `None` for degenerate or non-finite extents.
    pub fn try_new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Option<Self> {
        let finite = [x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite());
        if finite && x_max > x_min && y_max > y_min {
            Some(Self {
                x_min,
                x_max,
                y_min,
                y_max,
            })
        } else {
            None
        }
    }

    /// Width (x_max - x_min).
    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height (y_max - y_min).
    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check if a point is inside (edges inclusive).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Check if a point is inside `[x_min, x_max) × [y_min, y_max)`.
    ///
    /// Patches tile the plane with this convention so that a point on a
    /// shared edge belongs to exactly one of them.
    #[inline]
    pub fn contains_half_open(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x < self.x_max && y >= self.y_min && y < self.y_max
    }

    /// Whether the two rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge or corner do not overlap.
    pub fn overlaps(&self, other: &Bounds2D) -> bool {
        self.x_min < other.x_max
            && other.x_min < self.x_max
            && self.y_min < other.y_max
            && other.y_min < self.y_max
    }
}

impl fmt::Display for Bounds2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2}, {:.2}] × [{:.2}, {:.2}]",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let b = Bounds2D::new(0.0, 100.0, 0.0, 50.0);
        assert_eq!(b.x_min, 0.0);
        assert_eq!(b.x_max, 100.0);
        assert_eq!(b.y_min, 0.0);
        assert_eq!(b.y_max, 50.0);
        assert_eq!(b.area(), 5000.0);
    }

    #[test]
    fn test_contains_variants() {
        let b = Bounds2D::new(0.0, 100.0, 0.0, 50.0);
        assert!(b.contains(100.0, 50.0));
        assert!(!b.contains_half_open(100.0, 25.0));
        assert!(b.contains_half_open(0.0, 0.0));
        assert!(!b.contains(-1.0, 25.0));
    }

    #[test]
    fn test_overlap_excludes_touching() {
        let a = Bounds2D::new(0.0, 10.0, 0.0, 10.0);
        let touching = Bounds2D::new(10.0, 20.0, 0.0, 10.0);
        let overlapping = Bounds2D::new(9.0, 20.0, 5.0, 15.0);
        let disjoint = Bounds2D::new(30.0, 40.0, 30.0, 40.0);

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&overlapping));
        assert!(overlapping.overlaps(&a));
        assert!(!a.overlaps(&disjoint));
    }

    #[test]
    fn test_try_new_rejects_degenerate() {
        assert!(Bounds2D::try_new(0.0, 0.0, 0.0, 1.0).is_none());
        assert!(Bounds2D::try_new(0.0, 1.0, 2.0, 1.0).is_none());
        assert!(Bounds2D::try_new(f64::NAN, 1.0, 0.0, 1.0).is_none());
        assert!(Bounds2D::try_new(0.0, 1.0, 0.0, 1.0).is_some());
    }

    #[test]
    #[should_panic(expected = "x_max")]
    fn test_invalid_x() {
        Bounds2D::new(100.0, 0.0, 0.0, 50.0);
    }
}
