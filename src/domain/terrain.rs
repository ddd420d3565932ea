//! Ground height-field: a piecewise-linear outline plus decorative wind.
//!
//! The outline is an ordered list of control points with strictly
//! increasing x. Physics only ever asks two questions of it:
//!   - `height_at(x)`  — interpolated ground height
//!   - `normal_at(x)`  — unit normal of the bracketing segment
//!
//! Wind is a time-driven phase used by the rendering collaborator for
//! grass sway. It never affects height or normal queries.

use thiserror::Error;

use super::geom::Vec2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    #[error("terrain outline needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("terrain outline x must be strictly increasing at index {0}")]
    NonIncreasingX(usize),
}

/// Advance per tick of the decorative wind phase.
const WIND_RATE: f32 = 0.08;

pub struct Terrain {
    outline: Vec<Vec2>,
    wind_phase: f32,
}

impl Terrain {
    pub fn new(outline: Vec<Vec2>) -> Result<Terrain, TerrainError> {
        if outline.len() < 2 {
            return Err(TerrainError::TooFewPoints(outline.len()));
        }
        for i in 1..outline.len() {
            if outline[i].x <= outline[i - 1].x {
                return Err(TerrainError::NonIncreasingX(i));
            }
        }
        Ok(Terrain { outline, wind_phase: 0.0 })
    }

    pub fn outline(&self) -> &[Vec2] {
        &self.outline
    }

    /// Index of the first control point with x >= the query x, clamped so
    /// that it always names a valid segment end (1..len-1).
    fn bracket(&self, x: f32) -> usize {
        let i = self.outline.partition_point(|v| v.x < x);
        i.clamp(1, self.outline.len() - 1)
    }

    /// Interpolated ground height. Outside the outline's x-range this is
    /// the nearest endpoint's height.
    pub fn height_at(&self, x: f32) -> f32 {
        let first = self.outline[0];
        let last = self.outline[self.outline.len() - 1];
        if x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }
        let i = self.bracket(x);
        let (a, b) = (self.outline[i - 1], self.outline[i]);
        let frac = (x - a.x) / (b.x - a.x);
        frac * b.y + (1.0 - frac) * a.y
    }

    /// Unit normal of the segment bracketing x. Straight up outside the
    /// outline's range. Unaffected by wind.
    pub fn normal_at(&self, x: f32) -> Vec2 {
        let first = self.outline[0];
        let last = self.outline[self.outline.len() - 1];
        if x <= first.x || x >= last.x {
            return Vec2::UP;
        }
        let i = self.bracket(x);
        let seg = self.outline[i] - self.outline[i - 1];
        // x strictly increases along the outline, so seg is never
        // degenerate and its perpendicular points upward.
        seg.perpendicular().normalized().unwrap_or(Vec2::UP)
    }

    /// Advance the decorative wind animation one tick.
    pub fn tick(&mut self) {
        self.wind_phase += WIND_RATE;
    }

    /// Horizontal grass-sway offset at x for the current wind phase.
    /// Purely cosmetic; consumed by the rendering collaborator.
    pub fn sway_at(&self, x: f32) -> f32 {
        let p = self.wind_phase;
        4.0 * (p + x / 128.0 * 0.5).sin() + 3.0 * (p * 0.375 + x / 128.0 * 0.5).sin()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
