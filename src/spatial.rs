//! Grid and screen coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cell position in the grid, 0-indexed.
///
/// Signed so that positions outside the grid (including negative ones) can be
/// represented and rejected by bounds checks instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Single step toward `target`: each axis is normalised to -1, 0 or +1.
    pub fn step_toward(self, target: GridPos) -> (i32, i32) {
        ((target.x - self.x).signum(), (target.y - self.y).signum())
    }

    pub fn offset(self, step: (i32, i32)) -> GridPos {
        GridPos::new(self.x + step.0, self.y + step.1)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// Screen-space point or offset supplied by input and scrolling collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2, self.top + self.height / 2)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }
}

/// Scale between grid units and screen units, used only for hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub cell_size: i32,
}

impl Layout {
    pub fn new(cell_size: i32) -> Self {
        debug_assert!(cell_size > 0, "cell size must be positive");
        Self { cell_size }
    }

    /// Screen rectangle of a cell with the current scroll offset applied.
    pub fn cell_rect(&self, pos: GridPos, scroll: Point) -> Rect {
        Rect {
            left: pos.x * self.cell_size - scroll.x,
            top: pos.y * self.cell_size - scroll.y,
            width: self.cell_size,
            height: self.cell_size,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self { cell_size: 50 }
    }
}
