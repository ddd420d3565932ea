//! Opponent AI: a strategy state machine over the level's action API.
//!
//! Controllers issue exactly the action calls an input layer would issue
//! (run/jump/climb/attack/...), so AI and human characters share one
//! movement and combat path. The strategy is re-evaluated from scratch
//! every `STRATEGY_REVIEW` ticks:
//!
//!   - `Approach`  — close to melee range on the ground and swing
//!   - `ClimbCane` — the target went up a cane; pick a free cane on the
//!     correct side of it and mount
//!   - `CaneFight` — chase the target's height along the cane, swing
//!     when level with it
//!   - `Await`     — no usable cane; lurk at the base of the target's
//!     cane and wait for it to come down

use log::debug;

use crate::sim::level::Level;

use super::actor::{ActorId, Facing};
use super::geom::Vec2;

/// Targets further away than this are ignored entirely.
pub const SLEEP_DISTANCE: f32 = 700.0;
/// Ground attack range.
const MELEE_RANGE: f32 = 100.0;
/// Swing range while fighting along a cane.
const CANE_FIGHT_RANGE: f32 = 200.0;
/// Height difference considered "level with the target" on a cane.
const VERTICAL_TOLERANCE: f32 = 50.0;
/// Close enough to a chosen cane to mount it.
const CANE_CAPTURE: f32 = 20.0;
/// Canes further than this from the target are not worth using.
const CANE_SEARCH_RADIUS: f32 = 300.0;
/// How far to either side of the target a cane may stand.
const SIDE_TOLERANCE: f32 = 100.0;
/// Full strategy re-evaluation period, in ticks.
const STRATEGY_REVIEW: u32 = 30;
/// Cane re-pick period while in ClimbCane.
const CANE_REVIEW: u32 = 10;
/// Approach re-checks a climbing target this often.
const APPROACH_RECHECK: u32 = 60;
/// Controller-side pause between swings, on top of the character's own
/// cooldown.
const ATTACK_PAUSE: u32 = 100;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    Approach,
    ClimbCane,
    CaneFight,
    Await,
}

pub struct AiController {
    pub character: ActorId,
    target: Option<ActorId>,
    strategy: Option<Strategy>,
    strategy_age: u32,
    attack_timer: u32,
    target_cane: Option<ActorId>,
}

impl AiController {
    pub fn new(character: ActorId) -> AiController {
        AiController {
            character,
            target: None,
            strategy: None,
            strategy_age: 0,
            attack_timer: 0,
            target_cane: None,
        }
    }

    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    /// Death callback from the level when the owned character dies.
    pub fn on_character_death(&mut self) {
        self.target = None;
        self.strategy = None;
        self.target_cane = None;
    }

    /// One decision tick; called by the level before the physics phases.
    pub fn update(&mut self, level: &mut Level) {
        if self.attack_timer > 0 {
            self.attack_timer -= 1;
        }

        let target_alive = self
            .target
            .and_then(|t| level.character(t))
            .map_or(false, |c| c.alive);
        if !target_alive {
            self.target = self.choose_target(level);
            if self.target.is_none() {
                // nobody in range: idle
                self.strategy = None;
                return;
            }
        }

        if self.strategy.is_none() || self.strategy_age % STRATEGY_REVIEW == 0 {
            self.pick_strategy(level);
        }

        match self.strategy {
            Some(Strategy::Approach) => self.approach(level),
            Some(Strategy::ClimbCane) => self.climb_cane(level),
            Some(Strategy::CaneFight) => self.cane_fight(level),
            Some(Strategy::Await) => self.await_at_base(level),
            None => {}
        }
        self.strategy_age += 1;
    }

    // ── Target acquisition ──

    /// Nearest living opposing character, unless even the nearest is
    /// beyond the sleep distance.
    fn choose_target(&self, level: &Level) -> Option<ActorId> {
        let me = level.character(self.character)?;
        let my_pos = me.pos();
        let my_team = me.team;
        let mut nearest: Option<(ActorId, f32)> = None;
        for a in level.actors() {
            let Some(c) = a.as_character() else { continue };
            if c.id == self.character || !c.alive || !c.team.opposes(my_team) {
                continue;
            }
            let d = (c.pos() - my_pos).mag();
            if nearest.map_or(true, |(_, nd)| d < nd) {
                nearest = Some((c.id, d));
            }
        }
        nearest.and_then(|(id, d)| (d < SLEEP_DISTANCE).then_some(id))
    }

    fn set_strategy(&mut self, strategy: Strategy) {
        if self.strategy != Some(strategy) {
            debug!("{:?} switches strategy to {strategy:?}", self.character);
        }
        self.strategy = Some(strategy);
        self.strategy_age = 1;
    }

    fn pick_strategy(&mut self, level: &Level) {
        let climbing = self
            .target
            .and_then(|t| level.character(t))
            .map_or(false, |c| c.is_climbing());
        if climbing {
            self.set_strategy(Strategy::ClimbCane);
        } else {
            self.set_strategy(Strategy::Approach);
        }
    }

    // ── Shared movement helpers ──

    fn my_pos(&self, level: &Level) -> Option<Vec2> {
        level.character(self.character).map(|c| c.pos())
    }

    fn target_pos(&self, level: &Level) -> Option<Vec2> {
        self.target.and_then(|t| level.character(t)).map(|c| c.pos())
    }

    fn run_towards(&self, level: &mut Level, pos: Vec2) {
        let Some(my) = self.my_pos(level) else { return };
        if my.x < pos.x {
            level.run_right(self.character);
        } else {
            level.run_left(self.character);
        }
    }

    // ── Strategies ──

    fn approach(&mut self, level: &mut Level) {
        let Some(my_pos) = self.my_pos(level) else { return };
        let Some(target) = self.target.and_then(|t| level.character(t)) else { return };
        let target_pos = target.pos();
        let target_climbing = target.is_climbing();

        if target_climbing && self.strategy_age % APPROACH_RECHECK == 0 {
            self.pick_strategy(level);
        }
        if (target_pos - my_pos).mag() > MELEE_RANGE {
            self.run_towards(level, target_pos);
        } else {
            if self.attack_timer == 0 {
                level.attack(self.character);
                self.attack_timer = ATTACK_PAUSE;
            }
            level.stop(self.character);
        }
    }

    /// Free cane nearest to the target, restricted to the attacker's
    /// side when the attacker stands clearly off to one side.
    fn pick_cane(&self, level: &Level) -> Option<(ActorId, f32)> {
        let my_x = self.my_pos(level)?.x;
        let target_x = self.target_pos(level)?.x;

        let mut best: Option<(ActorId, f32)> = None;
        for a in level.actors() {
            let Some(cane) = a.as_cane() else { continue };
            let cane_x = cane.base.x;
            if my_x < target_x - SIDE_TOLERANCE && cane_x > target_x {
                continue;
            }
            if my_x > target_x + SIDE_TOLERANCE && cane_x < target_x {
                continue;
            }
            if cane.is_occupied() {
                continue;
            }
            let d = (target_x - cane_x).abs();
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((cane.id, d));
            }
        }
        best
    }

    fn climb_cane(&mut self, level: &mut Level) {
        if self.target_cane.is_none() || self.strategy_age % CANE_REVIEW == 0 {
            match self.pick_cane(level) {
                Some((cane, d)) if d < CANE_SEARCH_RADIUS => self.target_cane = Some(cane),
                _ => {
                    self.set_strategy(Strategy::Await);
                    return;
                }
            }
        }
        let Some(cane_id) = self.target_cane else { return };
        let Some(base) = level.cane(cane_id).map(|t| t.base) else {
            self.target_cane = None;
            return;
        };
        let Some(me) = level.character(self.character) else { return };
        let my_x = me.pos().x;
        let climbing = me.climbing;

        if climbing.is_some() && climbing != Some(cane_id) {
            // dismount toward the cane we actually want
            self.run_towards(level, base);
            level.jump(self.character);
        } else if (my_x - base.x).abs() < CANE_CAPTURE {
            level.mount(self.character, cane_id, 1.0);
            self.set_strategy(Strategy::CaneFight);
        } else {
            self.run_towards(level, base);
        }
    }

    fn cane_fight(&mut self, level: &mut Level) {
        let Some(my_pos) = self.my_pos(level) else { return };
        let Some(target_pos) = self.target_pos(level) else { return };

        if target_pos.y > my_pos.y + VERTICAL_TOLERANCE {
            level.climb_up(self.character);
        } else if target_pos.y < my_pos.y - VERTICAL_TOLERANCE {
            level.climb_down(self.character);
            let still_climbing = level
                .character(self.character)
                .map_or(false, |c| c.is_climbing());
            if !still_climbing {
                // ran out of cane; fight on foot
                self.set_strategy(Strategy::Approach);
            }
        } else {
            self.run_towards(level, target_pos);
            if (target_pos - my_pos).mag() < CANE_FIGHT_RANGE {
                level.attack(self.character);
            }
            level.stop(self.character);
        }
    }

    /// No cane worth climbing: shadow the base of the target's cane and
    /// wait for it to come down.
    fn await_at_base(&mut self, level: &mut Level) {
        let target_cane = self.target.and_then(|t| level.character(t)).and_then(|c| c.climbing);
        let Some(cane_id) = target_cane else {
            self.pick_strategy(level);
            return;
        };
        let Some(base) = level.cane(cane_id).map(|t| t.base) else { return };
        let Some(my_pos) = self.my_pos(level) else { return };

        if (base - my_pos).mag() > MELEE_RANGE {
            self.run_towards(level, base);
        } else if let Some(me) = level.character_mut(self.character) {
            me.facing = Facing::towards(my_pos.x, base.x);
            me.crouch();
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::domain::actor::{Actor, ActorKind, Team};
    use crate::domain::cane::Cane;
    use crate::domain::physics::{Character, CharacterStats};
    use crate::domain::terrain::Terrain;
    use crate::sim::resources::ResourceRegistry;

    fn flat_level() -> Level {
        let terrain =
            Terrain::new(vec![Vec2::new(0.0, 0.0), Vec2::new(4000.0, 0.0)]).unwrap();
        Level::new(terrain, SimConfig::default(), ResourceRegistry::new())
    }

    fn spawn(level: &mut Level, team: Team, x: f32) -> ActorId {
        let kind = match team {
            Team::Player => ActorKind::Swordsman,
            Team::Rival => ActorKind::Raider,
        };
        let c = Character::new(kind, team, CharacterStats::default());
        level.spawn(Actor::Character(c), x, None)
    }

    fn spawn_cane_at(level: &mut Level, x: f32) -> ActorId {
        level.spawn(Actor::Cane(Cane::with_defaults()), x, None)
    }

    #[test]
    fn idle_beyond_sleep_distance() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 10.0);
        spawn(&mut level, Team::Player, 760.0); // distance 750 > 700
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert!(ai.target().is_none());
        assert!(ai.strategy().is_none());
    }

    #[test]
    fn acquires_target_inside_sleep_distance() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 10.0);
        let prey = spawn(&mut level, Team::Player, 660.0);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.target(), Some(prey));
        assert_eq!(ai.strategy(), Some(Strategy::Approach));
    }

    #[test]
    fn prefers_the_nearest_opponent() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 500.0);
        spawn(&mut level, Team::Player, 900.0);
        let near = spawn(&mut level, Team::Player, 650.0);
        // teammates are never targets
        spawn(&mut level, Team::Rival, 510.0);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.target(), Some(near));
    }

    #[test]
    fn dead_target_dropped_on_next_cycle() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 10.0);
        let prey = spawn(&mut level, Team::Player, 200.0);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.target(), Some(prey));
        level.kill(prey);
        ai.update(&mut level);
        assert!(ai.target().is_none());
    }

    #[test]
    fn approach_runs_toward_distant_target() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 100.0);
        spawn(&mut level, Team::Player, 500.0);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        level.tick();
        assert!(level.character(me).unwrap().v.x > 0.0);
        assert_eq!(level.character(me).unwrap().facing, Facing::Right);
    }

    #[test]
    fn approach_attacks_in_melee_range() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 100.0);
        spawn(&mut level, Team::Player, 160.0);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert!(level.character(me).unwrap().attack_pending);
        // controller-side pause armed
        ai.update(&mut level);
        assert!(ai.attack_timer > 0);
    }

    #[test]
    fn switches_to_climb_cane_when_target_climbs() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 100.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        spawn_cane_at(&mut level, 410.0);
        spawn_cane_at(&mut level, 300.0);
        level.climb_up(prey); // prey grabs the cane at 410
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.strategy(), Some(Strategy::ClimbCane));
    }

    #[test]
    fn climb_cane_skips_occupied_canes() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 100.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        let taken = spawn_cane_at(&mut level, 410.0);
        let free = spawn_cane_at(&mut level, 350.0);
        level.climb_up(prey);
        assert!(level.cane(taken).unwrap().is_occupied());
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.target_cane, Some(free));
    }

    #[test]
    fn falls_back_to_await_with_no_free_cane() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 100.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        spawn_cane_at(&mut level, 410.0); // the only cane; prey takes it
        level.climb_up(prey);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.strategy(), Some(Strategy::Await));
    }

    #[test]
    fn mounts_chosen_cane_when_close_enough() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 340.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        spawn_cane_at(&mut level, 410.0);
        let free = spawn_cane_at(&mut level, 350.0);
        level.climb_up(prey);
        let mut ai = AiController::new(me);
        ai.update(&mut level); // picks the free cane, within 10 units: mounts
        assert_eq!(level.character(me).unwrap().climbing, Some(free));
        assert_eq!(ai.strategy(), Some(Strategy::CaneFight));
    }

    #[test]
    fn cane_fight_chases_target_height() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 340.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        spawn_cane_at(&mut level, 410.0);
        let mine = spawn_cane_at(&mut level, 350.0);
        level.climb_up(prey);
        // put the target well above
        for _ in 0..40 {
            level.climb_up(prey);
        }
        level.tick(); // placements update the prey's world position
        let mut ai = AiController::new(me);
        ai.update(&mut level); // ClimbCane, mounts
        assert_eq!(level.character(me).unwrap().climbing, Some(mine));
        let h0 = level.cane(mine).unwrap().climber_height(me).unwrap();
        ai.update(&mut level); // CaneFight: climbs up toward the prey
        let h1 = level.cane(mine).unwrap().climber_height(me).unwrap();
        assert!(h1 > h0);
    }

    #[test]
    fn await_lurks_at_cane_base() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 380.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        spawn_cane_at(&mut level, 410.0);
        level.climb_up(prey);
        let mut ai = AiController::new(me);
        ai.update(&mut level); // only cane occupied: Await
        assert_eq!(ai.strategy(), Some(Strategy::Await));
        // already within melee range of the base: faces it and crouches
        ai.update(&mut level);
        let c = level.character(me).unwrap();
        assert_eq!(c.facing, Facing::Right);
        assert!(c.crouching);
    }

    #[test]
    fn await_reconsiders_when_target_dismounts() {
        let mut level = flat_level();
        let me = spawn(&mut level, Team::Rival, 380.0);
        let prey = spawn(&mut level, Team::Player, 400.0);
        spawn_cane_at(&mut level, 410.0);
        level.climb_up(prey);
        let mut ai = AiController::new(me);
        ai.update(&mut level);
        assert_eq!(ai.strategy(), Some(Strategy::Await));
        level.jump(prey); // target leaves the cane
        ai.update(&mut level);
        assert_eq!(ai.strategy(), Some(Strategy::Approach));
    }
}
