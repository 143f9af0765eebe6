//! Pointer and bounding-box geometry used for insertion decisions.

use serde::{Deserialize, Serialize};

/// Primary axis along which siblings are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Columns arranged in a row
    Horizontal,
    /// Cards stacked in a column
    Vertical,
}

/// A pointer coordinate in viewport space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// Bounding box of a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Midpoint of the box along `axis`
    pub fn midpoint(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x + self.width / 2.0,
            Axis::Vertical => self.y + self.height / 2.0,
        }
    }

    /// Whether a pointer is past the midpoint, meaning "insert after"
    pub fn is_past_midpoint(&self, pointer: Point, axis: Axis) -> bool {
        pointer.along(axis) > self.midpoint(axis)
    }
}
