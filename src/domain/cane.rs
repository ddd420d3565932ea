//! Climbable cane: a chain of unit segments that sways in the wind.
//!
//! Geometry is a walk up the chain: each of `height` segments is
//! `piece_len` long, rotated by the fixed base tilt plus an even share of
//! the current wobble angle. Height/distance queries walk the same chain.
//!
//! Both `height_for_y` and `distance_from` are approximations that hold
//! only for small wobble angles. That is a documented property of the
//! simulation, not an oversight: balance was tuned against it, so no
//! exact closed form is attempted.
//!
//! Climbers are records owned by the cane. A climber's fractional height
//! along the chain lives here, never on the character; the level copies
//! placement results back to the characters each tick.

use thiserror::Error;

use super::actor::ActorId;
use super::geom::Vec2;

/// Distance climbed per up-step, in world units.
pub const CLIMB_STEP: f32 = 10.0;
/// Distance slid per down-step; descending is faster than climbing.
pub const SLIDE_STEP: f32 = 20.0;

const DEFAULT_HEIGHT: u32 = 20;
const DEFAULT_PIECE_LEN: f32 = 64.0;
const DEFAULT_RADIUS: f32 = 12.5;
/// Trunk thinning ratio per segment, for the drawing collaborator.
const DEFAULT_THINNING: f32 = 0.98;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaneError {
    #[error("cane does not reach a height of {0}")]
    BeyondTop(f32),
}

#[derive(Clone, Debug)]
struct Climber {
    actor: ActorId,
    /// Fractional segment index in [0, height - 2].
    height: f32,
}

/// Where the cane walk put a climber this tick.
#[derive(Clone, Copy, Debug)]
pub struct Placement {
    pub actor: ActorId,
    pub pos: Vec2,
    pub rotation: f32,
}

pub struct Cane {
    pub id: ActorId,
    pub base: Vec2,
    /// Number of chain segments.
    pub height: u32,
    pub piece_len: f32,
    pub radius: f32,
    pub thinning: f32,
    /// Fixed lean applied to the whole chain.
    pub base_angle: f32,
    /// Wind-driven lean, redistributed along the chain each tick.
    pub wobble_angle: f32,
    wind_phase: f32,
    climbers: Vec<Climber>,
}

impl Cane {
    pub fn new(height: u32) -> Cane {
        Cane {
            id: ActorId::UNSPAWNED,
            base: Vec2::ZERO,
            height: height.max(2),
            piece_len: DEFAULT_PIECE_LEN,
            radius: DEFAULT_RADIUS,
            thinning: DEFAULT_THINNING,
            base_angle: 0.0,
            wobble_angle: 0.0,
            wind_phase: 0.0,
            climbers: Vec::new(),
        }
    }

    pub fn with_defaults() -> Cane {
        Cane::new(DEFAULT_HEIGHT)
    }

    /// Stagger the wind phase by position so a grove doesn't sway in
    /// lockstep. Called once at spawn.
    pub fn seed_wind(&mut self) {
        self.wind_phase = 0.1 * self.base.x;
    }

    fn max_climb_height(&self) -> f32 {
        (self.height - 2) as f32
    }

    fn step_angle(&self) -> f32 {
        self.wobble_angle / self.height as f32
    }

    // ── Chain-walk queries ──

    /// Fractional segment index whose walked position reaches `y`.
    /// Only accurate for small wobble angles. Asking for a height the
    /// cane does not reach is a caller bug (stale climbing state) and is
    /// reported, not clamped.
    pub fn height_for_y(&self, y: f32) -> Result<f32, CaneError> {
        let da = self.step_angle();
        let mut pos = self.base;
        let mut step = Vec2::new(0.0, self.piece_len).rotate(self.base_angle);

        for i in 0..=self.height {
            if step.y <= 0.0 {
                // The chain has bent past horizontal; nothing above here.
                return Err(CaneError::BeyondTop(y));
            }
            let next = pos + step;
            if next.y >= y {
                return Ok(i as f32 + (y - pos.y) / step.y);
            }
            pos = next;
            step = step.rotate(da);
        }
        Err(CaneError::BeyondTop(y))
    }

    /// Approximate distance from `p` to the trunk. Below the base this is
    /// the straight-line distance to the base; alongside the chain it is
    /// the horizontal offset at that height; above the tip it is the
    /// distance to the tip. Only accurate for small wobble angles.
    pub fn distance_from(&self, p: Vec2) -> f32 {
        let da = self.step_angle();
        let mut pos = self.base;
        let mut step = Vec2::new(0.0, self.piece_len).rotate(self.base_angle);

        if pos.y > p.y {
            return (p - pos).mag();
        }
        for _ in 0..=self.height {
            if pos.y > p.y {
                return (pos.x - p.x).abs();
            }
            pos += step;
            step = step.rotate(da);
        }
        (p - pos).mag()
    }

    // ── Climber bookkeeping ──

    /// Attach a climber at the chain height matching its world y.
    pub fn add_climber(&mut self, actor: ActorId, y: f32) -> Result<f32, CaneError> {
        let h = self.height_for_y(y)?.clamp(0.0, self.max_climb_height());
        self.climbers.push(Climber { actor, height: h });
        Ok(h)
    }

    pub fn remove_climber(&mut self, actor: ActorId) {
        self.climbers.retain(|c| c.actor != actor);
    }

    pub fn is_occupied(&self) -> bool {
        !self.climbers.is_empty()
    }

    pub fn has_climber(&self, actor: ActorId) -> bool {
        self.climbers.iter().any(|c| c.actor == actor)
    }

    pub fn climber_height(&self, actor: ActorId) -> Option<f32> {
        self.climbers.iter().find(|c| c.actor == actor).map(|c| c.height)
    }

    /// Move a climber up by `dist` world units, clamped below the tip.
    pub fn climb_up(&mut self, actor: ActorId, dist: f32) {
        let top = self.max_climb_height();
        let step = dist / self.piece_len;
        if let Some(c) = self.climbers.iter_mut().find(|c| c.actor == actor) {
            c.height = (c.height + step).min(top);
        }
    }

    /// Move a climber down by `dist` world units. Reaching the base
    /// detaches the climber; returns true when that happened.
    pub fn climb_down(&mut self, actor: ActorId, dist: f32) -> bool {
        let step = dist / self.piece_len;
        let Some(c) = self.climbers.iter_mut().find(|c| c.actor == actor) else {
            return false;
        };
        c.height = (c.height - step).max(0.0);
        if c.height <= 0.0 {
            self.remove_climber(actor);
            return true;
        }
        false
    }

    // ── Animation ──

    /// Advance the wind sway one tick.
    pub fn tick(&mut self) {
        self.wind_phase += 1.0 / self.height as f32;
        self.wobble_angle =
            0.4 * self.wind_phase.sin() + 0.2 * (self.wind_phase * 0.21).sin();
    }

    /// Walk the chain once, producing the current world position and
    /// lean of every climber. The level writes these back to the
    /// characters; the cane never touches a character directly.
    pub fn climber_placements(&self) -> Vec<Placement> {
        let mut out = Vec::with_capacity(self.climbers.len());
        if self.climbers.is_empty() {
            return out;
        }

        let da = self.step_angle();
        let mut pos = self.base;
        let mut step = Vec2::new(0.0, self.piece_len).rotate(self.base_angle);
        let mut radius = Vec2::new(self.radius, 0.0).rotate(self.base_angle);

        for i in 0..=self.height {
            for c in &self.climbers {
                if c.height.floor() as u32 == i {
                    let frac = c.height - i as f32;
                    out.push(Placement {
                        actor: c.actor,
                        pos: pos + step * frac,
                        rotation: -radius.angle_in_degrees(),
                    });
                }
            }
            pos += step;
            step = step.rotate(da);
            radius = radius.rotate(da) * self.thinning;
        }
        out
    }

    /// Trunk centerline for the drawing collaborator, one point per
    /// segment joint, including the current wobble.
    pub fn trunk_polyline(&self) -> Vec<Vec2> {
        let da = self.step_angle();
        let mut pos = self.base;
        let mut step = Vec2::new(0.0, self.piece_len).rotate(self.base_angle);
        let mut out = Vec::with_capacity(self.height as usize + 1);
        for _ in 0..=self.height {
            out.push(pos);
            pos += step;
            step = step.rotate(da);
        }
        out
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn cane_at(x: f32) -> Cane {
        let mut c = Cane::with_defaults();
        c.base = Vec2::new(x, 0.0);
        c
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    // ── height_for_y ──

    #[test]
    fn height_for_y_on_straight_cane() {
        let c = cane_at(60.0);
        assert!(close(c.height_for_y(0.0).unwrap(), 0.0));
        assert!(close(c.height_for_y(64.0).unwrap(), 1.0));
        assert!(close(c.height_for_y(160.0).unwrap(), 2.5));
    }

    #[test]
    fn height_for_y_beyond_top_is_error() {
        let c = cane_at(60.0);
        // 20 segments * 64 = 1280 total extent
        assert_eq!(c.height_for_y(5000.0), Err(CaneError::BeyondTop(5000.0)));
    }

    #[test]
    fn height_for_y_tracks_small_wobble() {
        let mut c = cane_at(60.0);
        c.wobble_angle = 0.1;
        let h = c.height_for_y(320.0).unwrap();
        // Bent chain reaches a given y slightly later than a straight one.
        assert!(h >= 5.0);
        assert!(h < 5.2);
    }

    // ── distance_from ──

    #[test]
    fn distance_is_horizontal_alongside_trunk() {
        let c = cane_at(100.0);
        assert!(close(c.distance_from(Vec2::new(130.0, 300.0)), 30.0));
        assert!(close(c.distance_from(Vec2::new(70.0, 10.0)), 30.0));
    }

    #[test]
    fn distance_below_base_is_euclidean() {
        let c = cane_at(100.0);
        let d = c.distance_from(Vec2::new(97.0, -4.0));
        assert!(close(d, 5.0));
    }

    // ── Climbers ──

    #[test]
    fn add_climber_sets_height_from_y() {
        let mut c = cane_at(60.0);
        let h = c.add_climber(ActorId(1), 160.0).unwrap();
        assert!(close(h, 2.5));
        assert!(c.is_occupied());
        assert!(c.has_climber(ActorId(1)));
        c.remove_climber(ActorId(1));
        assert!(!c.is_occupied());
    }

    #[test]
    fn climb_up_step_matches_piece_length() {
        // height 20, piece 64: climbing 10 units from 5.0 lands on
        // 5 + 10/64 = 5.15625
        let mut c = cane_at(60.0);
        c.add_climber(ActorId(1), 5.0 * 64.0).unwrap();
        c.climb_up(ActorId(1), 10.0);
        assert!(close(c.climber_height(ActorId(1)).unwrap(), 5.0 + 10.0 / 64.0));
    }

    #[test]
    fn climb_height_clamped_below_tip() {
        let mut c = cane_at(60.0);
        c.add_climber(ActorId(1), 17.9 * 64.0).unwrap();
        for _ in 0..100 {
            c.climb_up(ActorId(1), 50.0);
        }
        assert!(close(c.climber_height(ActorId(1)).unwrap(), 18.0));
    }

    #[test]
    fn descending_to_base_detaches() {
        let mut c = cane_at(60.0);
        c.add_climber(ActorId(1), 30.0).unwrap();
        let mut detached = false;
        for _ in 0..10 {
            if c.climb_down(ActorId(1), SLIDE_STEP) {
                detached = true;
                break;
            }
        }
        assert!(detached);
        assert!(!c.has_climber(ActorId(1)));
    }

    #[test]
    fn multiple_climbers_may_share_a_segment() {
        let mut c = cane_at(60.0);
        c.add_climber(ActorId(1), 128.0).unwrap();
        c.add_climber(ActorId(2), 130.0).unwrap();
        assert!(c.has_climber(ActorId(1)));
        assert!(c.has_climber(ActorId(2)));
        let placements = c.climber_placements();
        assert_eq!(placements.len(), 2);
    }

    // ── Placement ──

    #[test]
    fn straight_cane_places_climber_on_trunk() {
        let mut c = cane_at(60.0);
        c.add_climber(ActorId(1), 160.0).unwrap();
        let p = c.climber_placements();
        assert_eq!(p.len(), 1);
        assert!(close(p[0].pos.x, 60.0));
        assert!(close(p[0].pos.y, 160.0));
        assert!(close(p[0].rotation, 0.0));
    }

    #[test]
    fn wobble_leans_the_placement() {
        let mut c = cane_at(60.0);
        c.add_climber(ActorId(1), 10.0 * 64.0).unwrap();
        c.wobble_angle = 0.3;
        let p = c.climber_placements();
        // Positive wobble rotates the chain counter-clockwise: the upper
        // trunk drifts left of the base.
        assert!(p[0].pos.x < 60.0);
        assert!(p[0].rotation != 0.0);
    }

    #[test]
    fn trunk_polyline_spans_full_extent() {
        let c = cane_at(0.0);
        let line = c.trunk_polyline();
        assert_eq!(line.len(), 21);
        assert!(close(line[0].y, 0.0));
        assert!(close(line[20].y, 20.0 * 64.0));
    }

    #[test]
    fn wobble_evolves_with_ticks() {
        let mut c = cane_at(60.0);
        let mut seen_nonzero = false;
        for _ in 0..50 {
            c.tick();
            if c.wobble_angle.abs() > 0.01 {
                seen_nonzero = true;
            }
            assert!(c.wobble_angle.abs() <= 0.6);
        }
        assert!(seen_nonzero);
    }
}
