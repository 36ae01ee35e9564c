//! Rectangular AMR patch with ghost-padded storage.
//!
//! A patch owns two flat arrays laid out row-major with `num_ghost` padding
//! cells on every side:
//! - `q`: `NUM_EQN` conserved variables per cell (h, hu, hv)
//! - `aux`: `NUM_AUX` auxiliary fields per cell (topography, friction coefficient)
//!
//! Interior cells are addressed by `(i, j)` in `0..mx × 0..my`; ghost cells by
//! negative indices or indices past the interior. Every accessor goes through
//! [`Patch::offset`], which panics on out-of-range indices instead of reading
//! a neighbouring row.

use crate::grid::CellState;
use crate::types::Bounds2D;

/// Number of conserved variables per cell.
pub const NUM_EQN: usize = 3;
/// Number of auxiliary fields per cell.
pub const NUM_AUX: usize = 2;
/// Aux slot holding bottom elevation.
pub const AUX_TOPO: usize = 0;
/// Aux slot holding the Darcy-Weisbach friction coefficient.
pub const AUX_FRICTION: usize = 1;

/// Geometry of a patch: origin, spacing, size and level.
///
/// Cheap to copy; kernels take it by value so they can run on row views
/// without borrowing the patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchGeometry {
    /// AMR level (0 = coarsest)
    pub level: usize,
    /// Lower-left corner x
    pub x_lower: f64,
    /// Lower-left corner y
    pub y_lower: f64,
    /// Cell width
    pub dx: f64,
    /// Cell height
    pub dy: f64,
    /// Interior cells in x
    pub mx: usize,
    /// Interior cells in y
    pub my: usize,
}

impl PatchGeometry {
    /// Geometry covering `bounds` with `mx × my` cells.
    pub fn new(level: usize, bounds: Bounds2D, mx: usize, my: usize) -> Self {
        assert!(mx > 0 && my > 0, "patch must have at least one cell");
        Self {
            level,
            x_lower: bounds.x_min,
            y_lower: bounds.y_min,
            dx: bounds.width() / mx as f64,
            dy: bounds.height() / my as f64,
            mx,
            my,
        }
    }

    /// Interior extent.
    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::new(
            self.x_lower,
            self.x_lower + self.dx * self.mx as f64,
            self.y_lower,
            self.y_lower + self.dy * self.my as f64,
        )
    }

    /// Area of one cell.
    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.dx * self.dy
    }

    /// Center of interior cell `(i, j)`.
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.x_lower + (i as f64 + 0.5) * self.dx,
            self.y_lower + (j as f64 + 0.5) * self.dy,
        )
    }

    /// Extent of interior cell `(i, j)`.
    pub fn cell_bounds(&self, i: usize, j: usize) -> Bounds2D {
        let x0 = self.x_lower + i as f64 * self.dx;
        let y0 = self.y_lower + j as f64 * self.dy;
        Bounds2D::new(x0, x0 + self.dx, y0, y0 + self.dy)
    }

    /// Interior cell containing `(x, y)`, using half-open cells.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !self.bounds().contains_half_open(x, y) {
            return None;
        }
        let i = ((x - self.x_lower) / self.dx).floor() as usize;
        let j = ((y - self.y_lower) / self.dy).floor() as usize;
        // Rounding right at the upper edge can land one past the interior.
        Some((i.min(self.mx - 1), j.min(self.my - 1)))
    }

    /// Number of interior cells.
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.mx * self.my
    }
}

/// One AMR patch: geometry plus ghost-padded `q` and `aux` storage.
#[derive(Clone, Debug)]
pub struct Patch {
    geometry: PatchGeometry,
    num_ghost: usize,
    q: Vec<f64>,
    aux: Vec<f64>,
}

impl Patch {
    /// Create a dry patch with zeroed aux fields.
    pub fn new(level: usize, bounds: Bounds2D, mx: usize, my: usize, num_ghost: usize) -> Self {
        let geometry = PatchGeometry::new(level, bounds, mx, my);
        let n_padded = (mx + 2 * num_ghost) * (my + 2 * num_ghost);
        Self {
            geometry,
            num_ghost,
            q: vec![0.0; n_padded * NUM_EQN],
            aux: vec![0.0; n_padded * NUM_AUX],
        }
    }

    /// Patch geometry.
    #[inline]
    pub fn geometry(&self) -> PatchGeometry {
        self.geometry
    }

    /// AMR level of this patch.
    #[inline]
    pub fn level(&self) -> usize {
        self.geometry.level
    }

    /// Interior extent.
    pub fn bounds(&self) -> Bounds2D {
        self.geometry.bounds()
    }

    /// Number of ghost cells on each side.
    #[inline]
    pub fn num_ghost(&self) -> usize {
        self.num_ghost
    }

    /// Padded row length in cells.
    #[inline]
    fn row_len(&self) -> usize {
        self.geometry.mx + 2 * self.num_ghost
    }

    /// Flat cell offset of `(i, j)`, ghost cells included.
    ///
    /// # Panics
    /// Panics if `(i, j)` lies outside the padded array.
    #[inline]
    pub fn offset(&self, i: isize, j: isize) -> usize {
        let ng = self.num_ghost as isize;
        let ii = i + ng;
        let jj = j + ng;
        let nx = self.row_len() as isize;
        let ny = (self.geometry.my + 2 * self.num_ghost) as isize;
        assert!(
            (0..nx).contains(&ii) && (0..ny).contains(&jj),
            "cell ({}, {}) outside patch with {}x{} cells and {} ghost layers",
            i,
            j,
            self.geometry.mx,
            self.geometry.my,
            self.num_ghost
        );
        (jj * nx + ii) as usize
    }

    /// State of cell `(i, j)`.
    #[inline]
    pub fn state(&self, i: isize, j: isize) -> CellState {
        let k = self.offset(i, j) * NUM_EQN;
        CellState::new(self.q[k], self.q[k + 1], self.q[k + 2])
    }

    /// Overwrite the state of cell `(i, j)`.
    #[inline]
    pub fn set_state(&mut self, i: isize, j: isize, state: CellState) {
        let k = self.offset(i, j) * NUM_EQN;
        self.q[k] = state.h;
        self.q[k + 1] = state.hu;
        self.q[k + 2] = state.hv;
    }

    /// Depth of cell `(i, j)`.
    #[inline]
    pub fn depth(&self, i: isize, j: isize) -> f64 {
        self.q[self.offset(i, j) * NUM_EQN]
    }

    /// Aux field `field` of cell `(i, j)`.
    #[inline]
    pub fn aux(&self, i: isize, j: isize, field: usize) -> f64 {
        assert!(field < NUM_AUX, "aux field {} out of range", field);
        self.aux[self.offset(i, j) * NUM_AUX + field]
    }

    /// Set aux field `field` of cell `(i, j)`.
    #[inline]
    pub fn set_aux(&mut self, i: isize, j: isize, field: usize, value: f64) {
        assert!(field < NUM_AUX, "aux field {} out of range", field);
        let k = self.offset(i, j) * NUM_AUX + field;
        self.aux[k] = value;
    }

    /// Fill every interior cell with `state`.
    pub fn fill(&mut self, state: CellState) {
        for j in 0..self.geometry.my as isize {
            for i in 0..self.geometry.mx as isize {
                self.set_state(i, j, state);
            }
        }
    }

    /// Sum of `h × cell_area` over interior cells.
    pub fn volume(&self) -> f64 {
        let area = self.geometry.cell_area();
        let mut total = 0.0;
        for j in 0..self.geometry.my as isize {
            for i in 0..self.geometry.mx as isize {
                total += self.depth(i, j) * area;
            }
        }
        total
    }

    /// Mutable views of the interior rows, in increasing `j`.
    ///
    /// Rows are disjoint, so the returned views can be handed to different
    /// threads.
    pub fn rows_mut(&mut self) -> Vec<RowView<'_>> {
        let ng = self.num_ghost;
        let mx = self.geometry.mx;
        let my = self.geometry.my;
        let row_len = self.row_len();

        self.q
            .chunks_mut(row_len * NUM_EQN)
            .zip(self.aux.chunks_mut(row_len * NUM_AUX))
            .skip(ng)
            .take(my)
            .enumerate()
            .map(|(j, (q_row, aux_row))| RowView {
                j,
                q: &mut q_row[ng * NUM_EQN..(ng + mx) * NUM_EQN],
                aux: &mut aux_row[ng * NUM_AUX..(ng + mx) * NUM_AUX],
            })
            .collect()
    }

    /// Run `f` on every interior row and collect the results in row order.
    ///
    /// With the `parallel` feature rows are processed on the rayon pool;
    /// the result order is the same either way.
    pub fn map_rows<T, F>(&mut self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&mut RowView<'_>) -> T + Sync + Send,
    {
        let rows = self.rows_mut();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            rows.into_par_iter().map(|mut row| f(&mut row)).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            rows.into_iter().map(|mut row| f(&mut row)).collect()
        }
    }
}

/// Mutable view of one interior row of a patch.
pub struct RowView<'a> {
    /// Row index (interior numbering)
    pub j: usize,
    q: &'a mut [f64],
    aux: &'a mut [f64],
}

impl RowView<'_> {
    /// Number of cells in the row.
    #[inline]
    pub fn len(&self) -> usize {
        self.q.len() / NUM_EQN
    }

    /// Whether the row has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// State of cell `i`.
    #[inline]
    pub fn state(&self, i: usize) -> CellState {
        let k = i * NUM_EQN;
        CellState::new(self.q[k], self.q[k + 1], self.q[k + 2])
    }

    /// Overwrite the state of cell `i`.
    #[inline]
    pub fn set_state(&mut self, i: usize, state: CellState) {
        let k = i * NUM_EQN;
        self.q[k] = state.h;
        self.q[k + 1] = state.hu;
        self.q[k + 2] = state.hv;
    }

    /// Depth of cell `i`.
    #[inline]
    pub fn depth(&self, i: usize) -> f64 {
        self.q[i * NUM_EQN]
    }

    /// Set the depth of cell `i`, leaving momentum untouched.
    #[inline]
    pub fn set_depth(&mut self, i: usize, h: f64) {
        self.q[i * NUM_EQN] = h;
    }

    /// Aux field `field` of cell `i`.
    #[inline]
    pub fn aux(&self, i: usize, field: usize) -> f64 {
        self.aux[i * NUM_AUX + field]
    }

    /// Set aux field `field` of cell `i`.
    #[inline]
    pub fn set_aux(&mut self, i: usize, field: usize, value: f64) {
        self.aux[i * NUM_AUX + field] = value;
    }
}
