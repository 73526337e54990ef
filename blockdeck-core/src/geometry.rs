//! Length units and element geometry
//!
//! Presentation coordinates are English Metric Units (EMU): 914 400 per inch
//! and 12 700 per point. Everything stored in the document tree is EMU; the
//! layout engine works in inches and converts at the boundary.

use serde::{Deserialize, Serialize};

/// Native length unit of the presentation format
pub type Emu = i64;

pub const EMU_PER_INCH: Emu = 914_400;
pub const EMU_PER_POINT: Emu = 12_700;

/// Convert EMU to inches
pub fn emu_to_inches(emu: Emu) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}

/// Convert inches to EMU, rounding to the nearest unit
pub fn inches_to_emu(inches: f64) -> Emu {
    (inches * EMU_PER_INCH as f64).round() as Emu
}

/// Convert EMU to points
pub fn emu_to_points(emu: Emu) -> f64 {
    emu as f64 / EMU_PER_POINT as f64
}

/// Axis-aligned box of an element, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl Bounds {
    /// Create bounds, clamping every component to be non-negative
    pub fn new(left: Emu, top: Emu, width: Emu, height: Emu) -> Self {
        Self {
            left: left.max(0),
            top: top.max(0),
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Create bounds for a freshly inserted element.
    ///
    /// Width and height are forced to at least one EMU.
    pub fn for_insert(left: Emu, top: Emu, width: Emu, height: Emu) -> Self {
        Self {
            left: left.max(0),
            top: top.max(0),
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Create bounds from inch measurements
    pub fn from_inches(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::for_insert(
            inches_to_emu(left),
            inches_to_emu(top),
            inches_to_emu(width),
            inches_to_emu(height),
        )
    }

    pub fn right(&self) -> Emu {
        self.left + self.width
    }

    pub fn bottom(&self) -> Emu {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
