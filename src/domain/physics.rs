//! Character body: force-accumulator platform physics.
//!
//! Forces accumulate between ticks; the accumulator always restarts at
//! the character's weight, so gravity needs no explicit re-application.
//! Ground contact is resolved as three components folded into the
//! accumulator right before it is read:
//!
//!   - restitution — impulse cancelling the velocity component into the
//!     ground along the surface normal
//!   - normal force — cancels the accumulated force into the ground
//!   - friction — opposes the tangential velocity (or, at rest, the
//!     tangential force), capped at `friction * |normal force|`
//!
//! `net_force` may be read exactly once per tick. While a character is
//! climbing, integration is bypassed entirely and its position is driven
//! by the cane's placement pass instead.

use super::actor::{ActorId, ActorKind, AnimKey, Facing, LayerMask, Team};
use super::geom::{Rect, Vec2};
use super::terrain::Terrain;

/// How close to the ground surface counts as standing on it.
pub const GROUND_EPSILON: f32 = 0.5;

/// Collision box dimensions.
pub const CHAR_WIDTH: f32 = 40.0;
pub const CHAR_HEIGHT: f32 = 100.0;
pub const CROUCH_HEIGHT: f32 = 60.0;

/// Downward velocity at which the falling animation takes over.
const FALL_ANIM_SPEED: f32 = -20.0;

/// Sideways nudge applied when running against a cane while climbing.
const CLIMB_SIDE_FORCE: f32 = 10.0;

// ══════════════════════════════════════════════════════════════
// Tuning
// ══════════════════════════════════════════════════════════════

/// Per-character tuning, filled from `config::SimConfig`.
#[derive(Clone, Debug)]
pub struct CharacterStats {
    pub mass: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub gravity: Vec2,
    pub ground_accel: f32,
    pub max_run_speed: f32,
    pub air_accel: f32,
    pub jump_impulse: f32,
    /// Rightward tree-jump impulse; x is negated for a leftward jump.
    pub tree_jump_impulse: Vec2,
    pub max_health: f32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        CharacterStats {
            mass: 15.0,
            friction: 0.6,
            linear_damping: 0.0,
            gravity: Vec2::new(0.0, -1.6),
            ground_accel: 10.0,
            max_run_speed: 15.0,
            air_accel: 5.0,
            jump_impulse: 28.0,
            tree_jump_impulse: Vec2::new(10.0, 15.0),
            max_health: 100.0,
        }
    }
}

/// Ground height/normal under the character, recomputed whenever the
/// position is set. Never read lazily.
#[derive(Clone, Copy, Debug)]
struct GroundSample {
    height: f32,
    normal: Vec2,
}

// ══════════════════════════════════════════════════════════════
// Character
// ══════════════════════════════════════════════════════════════

pub struct Character {
    pub id: ActorId,
    pub kind: ActorKind,
    pub team: Team,
    pub stats: CharacterStats,
    pos: Vec2,
    pub v: Vec2,
    /// Pending-force accumulator; reset to weight on every read.
    f: Vec2,
    ground: GroundSample,
    pub facing: Facing,
    pub crouching: bool,
    /// Cane currently climbed, if any. Climbing height lives in the cane.
    pub climbing: Option<ActorId>,
    /// Last vertical climb intent, for animation selection.
    pub climb_rate: f32,
    /// Transient look direction recorded while climbing; biases the
    /// tree-jump direction.
    pub looking: Option<Facing>,
    pub attack_cooldown: u32,
    /// Swing armed this frame, resolved in the combat phase.
    pub attack_pending: bool,
    pub health: f32,
    pub alive: bool,
    pub layers: LayerMask,
    pub rotation: f32,
    pub anim: AnimKey,
    /// Facing at the last animation event; sprites are directional, so a
    /// facing flip re-announces the key.
    pub anim_facing: Facing,
}

impl Character {
    pub fn new(kind: ActorKind, team: Team, stats: CharacterStats) -> Character {
        let weight = stats.gravity * stats.mass;
        let health = stats.max_health;
        Character {
            id: ActorId::UNSPAWNED,
            kind,
            team,
            stats,
            pos: Vec2::ZERO,
            v: Vec2::ZERO,
            f: weight,
            ground: GroundSample { height: 0.0, normal: Vec2::UP },
            facing: Facing::Right,
            crouching: false,
            climbing: None,
            climb_rate: 0.0,
            looking: None,
            attack_cooldown: 0,
            attack_pending: false,
            health,
            alive: true,
            layers: LayerMask::DEFAULT,
            rotation: 0.0,
            anim: AnimKey::Standing,
            anim_facing: Facing::Right,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    /// Move the character and refresh the cached ground sample.
    pub fn set_pos(&mut self, pos: Vec2, terrain: &Terrain) {
        self.pos = pos;
        self.ground = GroundSample {
            height: terrain.height_at(pos.x),
            normal: terrain.normal_at(pos.x),
        };
    }

    pub fn ground_height(&self) -> f32 {
        self.ground.height
    }

    pub fn ground_normal(&self) -> Vec2 {
        self.ground.normal
    }

    pub fn is_on_ground(&self) -> bool {
        self.pos.y <= self.ground.height + GROUND_EPSILON
    }

    pub fn is_climbing(&self) -> bool {
        self.climbing.is_some()
    }

    pub fn bounds(&self) -> Rect {
        let h = if self.crouching { CROUCH_HEIGHT } else { CHAR_HEIGHT };
        Rect::new(self.pos.x - CHAR_WIDTH * 0.5, self.pos.y, CHAR_WIDTH, h)
    }

    // ── Forces ──

    pub fn apply_force(&mut self, f: Vec2) {
        self.f += f;
    }

    pub fn apply_impulse(&mut self, i: Vec2) {
        self.v += i;
    }

    fn weight(&self) -> Vec2 {
        self.stats.gravity * self.stats.mass
    }

    fn apply_ground_force(&mut self) {
        let normal = self.ground.normal;
        let tangent = normal.perpendicular();

        let restitution = normal * -normal.dot(self.v).min(0.0);
        self.apply_impulse(restitution);

        let normal_force = normal * -normal.dot(self.f).min(0.0);
        self.apply_force(normal_force);

        let max_friction = self.stats.friction * normal_force.mag();
        let ground_velocity = self.v.project_onto(tangent);
        let ground_force = self.f.project_onto(tangent);
        if let Ok(dir) = ground_velocity.normalized() {
            // Stopping force implied by the velocity, but never more than
            // the friction cap.
            let f = max_friction.min(ground_velocity.mag() * self.stats.mass + ground_force.mag());
            self.apply_force(-dir * f);
        } else if let Ok(dir) = ground_force.normalized() {
            let f = ground_force.mag().min(max_friction);
            self.apply_force(-dir * f);
        }
    }

    /// Read and reset the force accumulator. Must be called exactly once
    /// per tick: ground contact is folded in here, and the accumulator
    /// restarts at the character's weight for the next tick.
    pub fn net_force(&mut self) -> Vec2 {
        if self.is_on_ground() {
            self.apply_ground_force();
        }
        let f = self.f;
        self.f = self.weight();
        f
    }

    /// One integration step. Callers skip this while the character is
    /// climbing; the cane drives its position instead.
    pub fn integrate(&mut self, terrain: &Terrain) {
        let f = self.net_force();
        let accel = f / self.stats.mass;
        self.v = (self.v + accel) * (1.0 - self.stats.linear_damping);
        self.set_pos(self.pos + self.v, terrain);
        if self.pos.y < self.ground.height {
            // Snap up to the surface; the vertical component was already
            // cancelled by restitution, horizontal velocity survives.
            let ground = self.ground.height;
            self.set_pos(Vec2::new(self.pos.x, ground), terrain);
        }
        self.rotation = 0.0;
    }

    /// Tick spent attached to a cane: the accumulator is still drained to
    /// honor the once-per-tick contract, but the result is discarded.
    pub fn drain_forces(&mut self) {
        // TODO: feed the drained force into the cane's sway instead of
        // dropping it, so a struggling climber shakes the cane.
        let _ = self.net_force();
    }

    // ── Movement state machine ──

    /// Speed-dependent run force: the further below the run-speed cap,
    /// the harder the character pushes.
    fn run_speed(&self) -> f32 {
        (self.stats.max_run_speed - self.v.mag()).max(0.0) * self.stats.ground_accel
    }

    /// Run toward `dir`. While climbing this only leans and records the
    /// look direction; on the ground it accelerates along the surface
    /// tangent, in the air it applies a weaker fixed force.
    pub fn run(&mut self, dir: Facing) {
        if !self.alive {
            return;
        }
        if self.is_climbing() {
            self.apply_force(Vec2::new(CLIMB_SIDE_FORCE * dir.sign(), 0.0));
            self.looking = Some(dir);
            return;
        }
        self.facing = dir;
        self.crouching = false;
        if self.is_on_ground() {
            let tangent = self.ground.normal.perpendicular();
            self.apply_force(tangent * (-dir.sign() * self.run_speed()));
        } else {
            self.apply_force(Vec2::new(self.stats.air_accel * dir.sign(), 0.0));
        }
    }

    /// Grounded jump. Returns true if an impulse was applied. The
    /// climbing branch (tree jump) is handled by the level, which owns
    /// the cane being detached from.
    pub fn jump_grounded(&mut self) -> bool {
        if !self.alive || !self.is_on_ground() || self.is_climbing() {
            return false;
        }
        self.crouching = false;
        self.apply_impulse(Vec2::new(0.0, self.stats.jump_impulse));
        true
    }

    /// Leap off a cane. The level has already detached the climber.
    pub fn tree_jump(&mut self) {
        let dir = self.looking.unwrap_or(self.facing);
        self.facing = dir;
        let imp = self.stats.tree_jump_impulse;
        self.apply_impulse(Vec2::new(imp.x * dir.sign(), imp.y));
        self.clear_climb_state();
    }

    pub fn clear_climb_state(&mut self) {
        self.climbing = None;
        self.climb_rate = 0.0;
        self.looking = None;
        self.rotation = 0.0;
    }

    /// Crouch; only meaningful on the ground, silently ignored otherwise.
    pub fn crouch(&mut self) {
        if self.alive && self.is_on_ground() && !self.is_climbing() {
            self.crouching = true;
        }
    }

    /// Release movement intent: uncrouch on the ground, or stop climbing
    /// motion on a cane. Residual velocity decays through friction.
    pub fn stop(&mut self) {
        if self.is_climbing() {
            self.climb_rate = 0.0;
            self.looking = None;
        } else {
            self.crouching = false;
        }
    }

    // ── Combat bookkeeping ──

    /// Apply knockback and damage. Returns true when this hit was lethal.
    pub fn take_hit(&mut self, force: Vec2, damage: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.apply_impulse(force);
        self.health -= damage;
        if self.health <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }

    pub fn tick_timers(&mut self) {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);
    }

    // ── Animation selection ──

    /// Derive the animation key from the current state. The rendering
    /// collaborator consumes key changes via events.
    pub fn select_anim(&self) -> AnimKey {
        if self.is_climbing() {
            if self.climb_rate > 0.0 {
                AnimKey::Climbing
            } else if self.climb_rate < 0.0 {
                AnimKey::SlidingDown
            } else {
                match self.looking {
                    None => AnimKey::Clinging,
                    Some(l) if l != self.facing => AnimKey::ClingingLookingOut,
                    Some(_) => AnimKey::ClingingLookingAcross,
                }
            }
        } else if self.crouching {
            AnimKey::Crouching
        } else if self.is_on_ground() {
            if self.v.mag() < 0.01 {
                AnimKey::Standing
            } else {
                AnimKey::Running
            }
        } else if self.v.y <= FALL_ANIM_SPEED {
            AnimKey::Falling
        } else {
            AnimKey::Jumping
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_ground() -> Terrain {
        Terrain::new(vec![Vec2::new(0.0, 100.0), Vec2::new(800.0, 100.0)]).unwrap()
    }

    fn resting_character(terrain: &Terrain) -> Character {
        let mut c = Character::new(ActorKind::Swordsman, Team::Player, CharacterStats::default());
        c.set_pos(Vec2::new(400.0, 100.0), terrain);
        c
    }

    #[test]
    fn rest_on_ground_is_stable() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.integrate(&t);
        assert_eq!(c.pos().y, 100.0);
        assert_eq!(c.v.y, 0.0);
        assert_eq!(c.v.x, 0.0);
    }

    #[test]
    fn stays_stable_over_many_ticks() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        for _ in 0..100 {
            c.integrate(&t);
        }
        assert!((c.pos().y - 100.0).abs() < 1e-3);
        assert!(c.v.mag() < 1e-3);
    }

    #[test]
    fn falls_when_airborne() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.set_pos(Vec2::new(400.0, 300.0), &t);
        c.integrate(&t);
        assert!(c.v.y < 0.0);
        assert!(c.pos().y < 300.0);
    }

    #[test]
    fn landing_snaps_to_surface() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.set_pos(Vec2::new(400.0, 101.0), &t);
        c.v = Vec2::new(3.0, -30.0);
        c.integrate(&t);
        assert!((c.pos().y - 100.0).abs() < 1e-3);
        // horizontal motion survives the landing
        assert!(c.pos().x > 400.0);
    }

    #[test]
    fn run_accelerates_along_ground() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.run(Facing::Right);
        c.integrate(&t);
        assert!(c.v.x > 0.0);
        assert_eq!(c.facing, Facing::Right);

        let mut l = resting_character(&t);
        l.run(Facing::Left);
        l.integrate(&t);
        assert!(l.v.x < 0.0);
    }

    #[test]
    fn run_force_shrinks_near_speed_cap() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        let fresh = c.run_speed();
        c.v = Vec2::new(c.stats.max_run_speed, 0.0);
        assert_eq!(c.run_speed(), 0.0);
        assert!(fresh > 0.0);
    }

    #[test]
    fn friction_brings_runner_to_rest() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.v = Vec2::new(8.0, 0.0);
        for _ in 0..200 {
            c.integrate(&t);
        }
        assert!(c.v.mag() < 0.01);
    }

    #[test]
    fn jump_leaves_the_ground() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.crouch();
        assert!(c.crouching);
        assert!(c.jump_grounded());
        assert!(!c.crouching);
        c.integrate(&t);
        assert!(c.pos().y > 100.0);
        assert!(!c.is_on_ground());
        // a second jump in the air is refused
        assert!(!c.jump_grounded());
    }

    #[test]
    fn crouch_denied_in_air() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.set_pos(Vec2::new(400.0, 250.0), &t);
        c.crouch();
        assert!(!c.crouching);
    }

    #[test]
    fn tree_jump_follows_looking_direction() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.climbing = Some(ActorId(7));
        c.looking = Some(Facing::Left);
        c.tree_jump();
        assert!(c.v.x < 0.0);
        assert!(c.v.y > 0.0);
        assert_eq!(c.facing, Facing::Left);
        assert!(c.climbing.is_none());
    }

    #[test]
    fn tree_jump_without_looking_uses_facing() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.facing = Facing::Right;
        c.climbing = Some(ActorId(7));
        c.tree_jump();
        assert!(c.v.x > 0.0);
    }

    #[test]
    fn hit_reduces_health_and_kills_at_zero() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        assert!(!c.take_hit(Vec2::new(1.0, 0.0), 40.0));
        assert_eq!(c.health, 60.0);
        assert!(c.take_hit(Vec2::ZERO, 60.0));
        assert!(!c.alive);
        // further hits on a corpse are no-ops
        assert!(!c.take_hit(Vec2::ZERO, 10.0));
    }

    #[test]
    fn dead_characters_ignore_actions() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.alive = false;
        c.run(Facing::Right);
        c.crouch();
        assert!(!c.jump_grounded());
        c.integrate(&t);
        assert_eq!(c.v.x, 0.0);
        assert!(!c.crouching);
    }

    #[test]
    fn anim_selection_on_ground_and_air() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        assert_eq!(c.select_anim(), AnimKey::Standing);
        c.v = Vec2::new(5.0, 0.0);
        assert_eq!(c.select_anim(), AnimKey::Running);
        c.crouching = true;
        assert_eq!(c.select_anim(), AnimKey::Crouching);
        c.crouching = false;
        c.set_pos(Vec2::new(400.0, 400.0), &t);
        c.v = Vec2::new(0.0, 5.0);
        assert_eq!(c.select_anim(), AnimKey::Jumping);
        c.v = Vec2::new(0.0, -25.0);
        assert_eq!(c.select_anim(), AnimKey::Falling);
    }

    #[test]
    fn anim_selection_while_climbing() {
        let t = flat_ground();
        let mut c = resting_character(&t);
        c.climbing = Some(ActorId(3));
        assert_eq!(c.select_anim(), AnimKey::Clinging);
        c.climb_rate = 1.0;
        assert_eq!(c.select_anim(), AnimKey::Climbing);
        c.climb_rate = -1.0;
        assert_eq!(c.select_anim(), AnimKey::SlidingDown);
        c.climb_rate = 0.0;
        c.facing = Facing::Right;
        c.looking = Some(Facing::Left);
        assert_eq!(c.select_anim(), AnimKey::ClingingLookingOut);
        c.looking = Some(Facing::Right);
        assert_eq!(c.select_anim(), AnimKey::ClingingLookingAcross);
    }
}
