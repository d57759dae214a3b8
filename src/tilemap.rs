//! 2D grid storage and coordinate resolution.
//!
//! Every grid lookup in the crate goes through [`Tilemap::resolve`] (or one of
//! the neighbor helpers built on it), so toroidal wrapping and edge rejection
//! live in exactly one place.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::HydrologyError;

/// A cell position inside a grid. Always in range once produced by [`Tilemap::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// How coordinates past the grid edge are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Toroidal: both axes wrap around.
    #[default]
    Wrap,
    /// Out-of-range coordinates are rejected.
    Clamp,
}

impl EdgeMode {
    pub fn wraps(&self) -> bool {
        matches!(self, EdgeMode::Wrap)
    }
}

/// 4-connected offsets (dx, dy) in scan order: N, E, S, W
pub const DIR_4: [(i32, i32); 4] = [
    (0, -1), // N
    (1, 0),  // E
    (0, 1),  // S
    (-1, 0), // W
];

/// 8-connected offsets (dx, dy)
/// Order: N, NE, E, SE, S, SW, W, NW
pub const DIR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
];

/// True if (x, y) lies within `radius` of (cx, cy), edge included.
pub fn in_circle(radius: i64, cx: i64, cy: i64, x: i64, y: i64) -> bool {
    let dx = cx - x;
    let dy = cy - y;
    dx * dx + dy * dy <= radius * radius
}

/// A row-major W×H grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a grid from row-major data.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, HydrologyError> {
        if data.len() != width * height {
            return Err(HydrologyError::DataLength {
                expected: width * height,
                found: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) outside {}x{}", self.width, self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn same_dimensions<U>(&self, other: &Tilemap<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| (idx % width, idx / width, val))
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| (idx % width, idx / width, val))
    }
}

impl<T> Tilemap<T> {
    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
    }

    pub fn is_out_of_bounds(&self, x: i64, y: i64) -> bool {
        x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64
    }

    /// Resolve a raw coordinate. Wrap mode folds both axes back into range,
    /// clamp mode returns `None` for anything off the grid.
    pub fn resolve(&self, x: i64, y: i64, mode: EdgeMode) -> Option<Coord> {
        match mode {
            EdgeMode::Wrap => Some(Coord::new(
                x.rem_euclid(self.width as i64) as usize,
                y.rem_euclid(self.height as i64) as usize,
            )),
            EdgeMode::Clamp => {
                if self.is_out_of_bounds(x, y) {
                    None
                } else {
                    Some(Coord::new(x as usize, y as usize))
                }
            }
        }
    }

    /// Resolve `c + (dx, dy)`.
    pub fn offset(&self, c: Coord, dx: i32, dy: i32, mode: EdgeMode) -> Option<Coord> {
        self.resolve(c.x as i64 + dx as i64, c.y as i64 + dy as i64, mode)
    }

    /// 4-connected neighbors in N, E, S, W order.
    pub fn neighbors_4(&self, c: Coord, mode: EdgeMode) -> impl Iterator<Item = Coord> + '_ {
        DIR_4.iter().filter_map(move |&(dx, dy)| self.offset(c, dx, dy, mode))
    }

    /// 8-connected neighbors in N, NE, E, SE, S, SW, W, NW order.
    pub fn neighbors_8(&self, c: Coord, mode: EdgeMode) -> impl Iterator<Item = Coord> + '_ {
        DIR_OFFSETS.iter().filter_map(move |&(dx, dy)| self.offset(c, dx, dy, mode))
    }

    /// Shortest signed offset from `from` to `to`. In wrap mode each axis takes
    /// the shorter way around the torus.
    pub fn wrapped_delta(&self, from: Coord, to: Coord, mode: EdgeMode) -> (i64, i64) {
        let dx = to.x as i64 - from.x as i64;
        let dy = to.y as i64 - from.y as i64;
        match mode {
            EdgeMode::Clamp => (dx, dy),
            EdgeMode::Wrap => (
                shortest_axis_offset(dx, self.width as i64),
                shortest_axis_offset(dy, self.height as i64),
            ),
        }
    }

    pub fn distance_sq(&self, a: Coord, b: Coord, mode: EdgeMode) -> i64 {
        let (dx, dy) = self.wrapped_delta(a, b, mode);
        dx * dx + dy * dy
    }

    /// Chebyshev distance, wrap-aware.
    pub fn chebyshev(&self, a: Coord, b: Coord, mode: EdgeMode) -> i64 {
        let (dx, dy) = self.wrapped_delta(a, b, mode);
        dx.abs().max(dy.abs())
    }
}

fn shortest_axis_offset(d: i64, size: i64) -> i64 {
    let d = d.rem_euclid(size);
    if d > size / 2 {
        d - size
    } else {
        d
    }
}

impl<T: Clone> Index<Coord> for Tilemap<T> {
    type Output = T;

    fn index(&self, c: Coord) -> &T {
        self.get(c.x, c.y)
    }
}

impl<T: Clone> IndexMut<Coord> for Tilemap<T> {
    fn index_mut(&mut self, c: Coord) -> &mut T {
        self.get_mut(c.x, c.y)
    }
}

impl Tilemap<f32> {
    /// (min, max) over all cells.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min_h = f32::MAX;
        let mut max_h = f32::MIN;
        for &h in &self.data {
            if h < min_h { min_h = h; }
            if h > max_h { max_h = h; }
        }
        (min_h, max_h)
    }

    /// Cell-wise `self - other`. Panics on mismatched dimensions.
    pub fn difference(&self, other: &Tilemap<f32>) -> Tilemap<f32> {
        assert!(self.same_dimensions(other), "difference of mismatched grids");
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect(),
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// Number of cells with a value above zero.
    pub fn count_positive(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0.0).count()
    }
}
