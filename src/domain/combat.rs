//! Melee combat geometry and pairwise separation.
//!
//! Attacks carve a directional rectangle in front of the attacker; every
//! other character whose bounds intersect it shares one fixed damage pool
//! and one fixed knockback pool evenly. Separation is a cheap positional
//! correction, not an impulse response: overlapping characters are nudged
//! one unit apart per tick along the line between their centers.

use super::actor::Facing;
use super::geom::{Rect, Vec2};

/// Combat tuning, filled from `config::SimConfig`.
#[derive(Clone, Debug)]
pub struct CombatTuning {
    /// How far the swing extends in the facing direction.
    pub reach: f32,
    pub swing_height: f32,
    /// Swing box lift above the feet when standing.
    pub stand_lift: f32,
    /// Lift while crouching; a crouch swing sweeps low.
    pub crouch_lift: f32,
    /// Total damage shared by all victims of one swing.
    pub damage_pool: f32,
    /// Total knockback impulse shared by all victims of one swing.
    pub knockback: f32,
    /// Ticks between swings.
    pub cooldown: u32,
    /// Extra can't-act frames tacked onto the cooldown.
    pub recovery: u32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        CombatTuning {
            reach: 80.0,
            swing_height: 50.0,
            stand_lift: 40.0,
            crouch_lift: 10.0,
            damage_pool: 10.0,
            knockback: 30.0,
            cooldown: 30,
            recovery: 6,
        }
    }
}

/// The hit box for a swing from `origin` (the attacker's feet).
pub fn attack_rect(origin: Vec2, dir: Facing, crouching: bool, t: &CombatTuning) -> Rect {
    let lift = if crouching { t.crouch_lift } else { t.stand_lift };
    let l = match dir {
        Facing::Right => origin.x,
        Facing::Left => origin.x - t.reach,
    };
    Rect::new(l, origin.y + lift, t.reach, t.swing_height)
}

/// Impact point reported for a victim: the center of its overlap with
/// the attack rect, or its own center if the overlap degenerated away.
pub fn impact_point(victim: &Rect, attack: &Rect) -> Vec2 {
    attack
        .intersection(victim)
        .map(|o| o.center())
        .unwrap_or_else(|| victim.center())
}

/// Separation nudge for two overlapping bodies: the unit vector from
/// `b`'s center toward `a`'s center. `a` moves by it, `b` by its
/// negation. None when the bounds do not overlap. Coincident centers
/// fall back to a horizontal push so stacked actors still separate.
pub fn separation_push(a: &Rect, b: &Rect) -> Option<Vec2> {
    if !a.intersects(b) {
        return None;
    }
    let between = a.center() - b.center();
    Some(between.normalized().unwrap_or(Vec2::new(1.0, 0.0)))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
