//! The Level: owner of every actor and controller, and the conductor of
//! the fixed-step simulation.
//!
//! Tick order is fixed:
//!   1. AI decisions (controllers issue the same action calls an input
//!      layer would)
//!   2. Collision separation + attack resolution
//!   3. Per-actor physics/state update
//!   4. Decorative terrain and cane animation
//!
//! Mutation safety: controllers are updated over a snapshot
//! (`mem::take`), and deaths requested mid-phase go through a deferred
//! queue reaped at phase boundaries. `kill` itself removes an actor and
//! its controller atomically in one call.

use std::mem;

use log::{debug, warn};

use crate::config::SimConfig;
use crate::domain::actor::{self, Actor, ActorId, ActorKind, BloodSpray, Corpse, Facing, Team};
use crate::domain::ai::AiController;
use crate::domain::cane::{self, Cane};
use crate::domain::combat::{self, CombatTuning};
use crate::domain::geom::{Rect, Vec2};
use crate::domain::physics::Character;
use crate::domain::terrain::{Terrain, TerrainError};

use super::event::{GameEvent, SoundKey};
use super::resources::ResourceRegistry;

/// Max distance at which a character can grab a cane.
pub const CLIMB_CAPTURE_RADIUS: f32 = 30.0;

// ══════════════════════════════════════════════════════════════
// Pre-parsed level data
// ══════════════════════════════════════════════════════════════

/// One spawn point as delivered by the external level loader.
/// `y: None` means "on the ground".
#[derive(Clone, Debug)]
pub struct SpawnDef {
    pub kind: ActorKind,
    pub x: f32,
    pub y: Option<f32>,
}

/// Plain coordinate/name data from the external loader; the core never
/// parses level files itself.
#[derive(Clone, Debug, Default)]
pub struct LevelDef {
    pub outline: Vec<(f32, f32)>,
    pub spawns: Vec<SpawnDef>,
}

// ══════════════════════════════════════════════════════════════
// Level
// ══════════════════════════════════════════════════════════════

pub struct Level {
    pub terrain: Terrain,
    cfg: SimConfig,
    combat: CombatTuning,
    actors: Vec<Actor>,
    controllers: Vec<AiController>,
    registry: ResourceRegistry,
    events: Vec<GameEvent>,
    pending_kills: Vec<ActorId>,
    next_id: u32,
}

/// An armed swing collected for resolution.
struct Swing {
    attacker: ActorId,
    rect: Rect,
    dir: Facing,
}

impl Level {
    pub fn new(terrain: Terrain, cfg: SimConfig, registry: ResourceRegistry) -> Level {
        let combat = cfg.combat.clone();
        Level {
            terrain,
            cfg,
            combat,
            actors: Vec::new(),
            controllers: Vec::new(),
            registry,
            events: Vec::new(),
            pending_kills: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a populated level from pre-parsed loader data. Raiders get
    /// an AI controller; swordsmen are left for the input layer.
    pub fn from_def(
        def: &LevelDef,
        cfg: SimConfig,
        registry: ResourceRegistry,
    ) -> Result<Level, TerrainError> {
        let outline = def.outline.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        let terrain = Terrain::new(outline)?;
        let mut level = Level::new(terrain, cfg, registry);
        for s in &def.spawns {
            match s.kind {
                ActorKind::Cane => {
                    level.spawn(Actor::Cane(Cane::with_defaults()), s.x, s.y);
                }
                ActorKind::Swordsman => {
                    let c =
                        Character::new(ActorKind::Swordsman, Team::Player, level.character_stats());
                    level.spawn(Actor::Character(c), s.x, s.y);
                }
                ActorKind::Raider => {
                    let c = Character::new(ActorKind::Raider, Team::Rival, level.character_stats());
                    level.spawn_opponent(Actor::Character(c), s.x, s.y);
                }
                other => warn!("level data spawns unsupported kind {other:?}, skipping"),
            }
        }
        Ok(level)
    }

    /// Tuning for characters constructed by the caller.
    pub fn character_stats(&self) -> crate::domain::physics::CharacterStats {
        self.cfg.stats.clone()
    }

    // ── Spawn / kill ──

    /// Add an actor at x; y defaults to the ground surface. Assigns the
    /// id, fires the one-time resource hook for new kinds, and runs the
    /// on-spawn hook.
    pub fn spawn(&mut self, mut actor: Actor, x: f32, y: Option<f32>) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        actor.set_id(id);

        let y = y.unwrap_or_else(|| self.terrain.height_at(x));
        let pos = Vec2::new(x, y);
        match &mut actor {
            Actor::Character(c) => c.set_pos(pos, &self.terrain),
            Actor::Cane(t) => {
                t.base = pos;
                t.seed_wind();
            }
            Actor::Corpse(c) => c.pos = pos,
            Actor::Spray(s) => s.pos = pos,
        }

        let kind = actor.kind();
        if self.registry.mark(kind) {
            self.events.push(GameEvent::ResourcesRequested { kind });
        }
        self.events.push(GameEvent::Spawned { id, kind });
        if let Actor::Character(c) = &mut actor {
            c.anim = c.select_anim();
            c.anim_facing = c.facing;
            self.events.push(GameEvent::AnimationChanged { id, key: c.anim, facing: c.facing });
        }
        debug!("spawned {kind:?} as {id:?} at ({x}, {y})");
        self.actors.push(actor);
        id
    }

    pub fn add_controller(&mut self, controller: AiController) {
        self.controllers.push(controller);
    }

    /// Spawn an actor and attach an AI controller to it in one call.
    pub fn spawn_opponent(&mut self, actor: Actor, x: f32, y: Option<f32>) -> ActorId {
        let id = self.spawn(actor, x, y);
        self.add_controller(AiController::new(id));
        id
    }

    /// Remove an actor now. Detaches it from any cane, notifies and
    /// removes its owning controller — all in one call, so the actor and
    /// controller lists never disagree. Unknown ids are ignored.
    pub fn kill(&mut self, id: ActorId) {
        if let Some(cane_id) = actor::find_character(&self.actors, id).and_then(|c| c.climbing) {
            if let Some(t) = actor::find_cane_mut(&mut self.actors, cane_id) {
                t.remove_climber(id);
            }
        }
        let before = self.actors.len();
        self.actors.retain(|a| a.id() != id);
        if self.actors.len() == before {
            return;
        }
        if let Some(c) = self.controllers.iter_mut().find(|c| c.character == id) {
            c.on_character_death();
        }
        self.controllers.retain(|c| c.character != id);
        self.events.push(GameEvent::Removed { id });
        debug!("killed {id:?}");
    }

    /// Defer a removal until the current phase finishes iterating.
    pub fn request_kill(&mut self, id: ActorId) {
        if !self.pending_kills.contains(&id) {
            self.pending_kills.push(id);
        }
    }

    fn reap(&mut self) {
        while let Some(id) = self.pending_kills.pop() {
            self.kill(id);
        }
    }

    // ── Queries ──

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        actor::find(&self.actors, id)
    }

    pub fn character(&self, id: ActorId) -> Option<&Character> {
        actor::find_character(&self.actors, id)
    }

    pub fn character_mut(&mut self, id: ActorId) -> Option<&mut Character> {
        actor::find_character_mut(&mut self.actors, id)
    }

    pub fn cane(&self, id: ActorId) -> Option<&Cane> {
        actor::find_cane(&self.actors, id)
    }

    pub fn controllers(&self) -> &[AiController] {
        &self.controllers
    }

    /// Nearest climbable cane and its approximate distance from `pos`.
    pub fn get_nearest_climbable(&self, pos: Vec2) -> Option<(ActorId, f32)> {
        let mut best: Option<(ActorId, f32)> = None;
        for a in &self.actors {
            if let Actor::Cane(t) = a {
                let d = t.distance_from(pos);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((t.id, d));
                }
            }
        }
        best
    }

    /// Living player-team characters.
    pub fn find_player_characters(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter_map(Actor::as_character)
            .filter(|c| c.alive && c.team == Team::Player)
            .map(|c| c.id)
            .collect()
    }

    /// Living characters whose bounds intersect `rect`.
    pub fn characters_colliding(&self, rect: &Rect) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter_map(Actor::as_character)
            .filter(|c| c.alive && c.bounds().intersects(rect))
            .map(|c| c.id)
            .collect()
    }

    // ── Action API ──
    //
    // Issued each tick by AI controllers and by the external input
    // layer. Denied intents are silent no-ops.

    pub fn run_left(&mut self, id: ActorId) {
        if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
            c.run(Facing::Left);
        }
    }

    pub fn run_right(&mut self, id: ActorId) {
        if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
            c.run(Facing::Right);
        }
    }

    pub fn crouch(&mut self, id: ActorId) {
        if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
            c.crouch();
        }
    }

    pub fn stop(&mut self, id: ActorId) {
        if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
            c.stop();
        }
    }

    pub fn jump(&mut self, id: ActorId) {
        let Some(c) = actor::find_character(&self.actors, id) else { return };
        if !c.alive {
            return;
        }
        if let Some(cane_id) = c.climbing {
            if let Some(t) = actor::find_cane_mut(&mut self.actors, cane_id) {
                t.remove_climber(id);
            }
            if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
                c.tree_jump();
            }
            self.events.push(GameEvent::Sound { id, sound: SoundKey::Jump });
        } else if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
            if c.jump_grounded() {
                self.events.push(GameEvent::Sound { id, sound: SoundKey::Jump });
            }
        }
    }

    pub fn climb_up(&mut self, id: ActorId) {
        self.climb(id, cane::CLIMB_STEP, 1.0);
    }

    pub fn climb_down(&mut self, id: ActorId) {
        self.climb(id, cane::SLIDE_STEP, -1.0);
    }

    fn climb(&mut self, id: ActorId, dist: f32, rate: f32) {
        let Some(c) = actor::find_character(&self.actors, id) else { return };
        if !c.alive {
            return;
        }
        match c.climbing {
            Some(cane_id) => {
                let detached = match actor::find_cane_mut(&mut self.actors, cane_id) {
                    Some(t) if rate > 0.0 => {
                        t.climb_up(id, dist);
                        false
                    }
                    Some(t) => t.climb_down(id, dist),
                    None => false,
                };
                if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
                    if detached {
                        c.clear_climb_state();
                    } else {
                        c.climb_rate = rate;
                    }
                }
            }
            None => {
                let pos = c.pos();
                let Some((cane_id, d)) = self.get_nearest_climbable(pos) else { return };
                if d > CLIMB_CAPTURE_RADIUS {
                    return;
                }
                self.mount(id, cane_id, rate);
            }
        }
    }

    /// Attach a character to a specific cane. Used by the AI, which
    /// chooses its cane deliberately rather than taking the nearest.
    pub fn mount(&mut self, id: ActorId, cane_id: ActorId, rate: f32) {
        let Some(c) = actor::find_character(&self.actors, id) else { return };
        if !c.alive || c.is_climbing() {
            return;
        }
        let y = c.pos().y;
        let facing = c.facing;
        match actor::find_cane_mut(&mut self.actors, cane_id).map(|t| t.add_climber(id, y)) {
            Some(Ok(_)) => {
                if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
                    c.climbing = Some(cane_id);
                    c.looking = Some(facing);
                    c.climb_rate = rate;
                }
            }
            Some(Err(e)) => warn!("mount of {id:?} on {cane_id:?} refused: {e}"),
            None => {}
        }
    }

    /// Arm a swing. Consumed by the combat phase; refused while the
    /// cooldown runs.
    pub fn attack(&mut self, id: ActorId) {
        if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
            if c.alive && c.attack_cooldown == 0 {
                c.attack_pending = true;
            }
        }
    }

    /// Apply a hit to a character: knockback, damage, a cosmetic spray
    /// at the impact point, and — on a lethal hit — a corpse, the death
    /// callback and removal from the level.
    pub fn hit(&mut self, id: ActorId, point: Vec2, force: Vec2, damage: f32) {
        let Some(c) = actor::find_character_mut(&mut self.actors, id) else { return };
        if !c.alive {
            return;
        }
        let kind = c.kind;
        let facing = c.facing;
        let pos = c.pos();
        let died = c.take_hit(force, damage);

        self.events.push(GameEvent::Sound { id, sound: SoundKey::Hit });
        self.spawn(Actor::Spray(BloodSpray::new(point, force)), point.x, Some(point.y));

        if died {
            let corpse =
                self.spawn(Actor::Corpse(Corpse::new(kind, pos, facing)), pos.x, Some(pos.y));
            self.events.push(GameEvent::Sound { id, sound: SoundKey::Death });
            self.events.push(GameEvent::Died { id, corpse });
            self.request_kill(id);
        }
    }

    // ── The tick ──

    /// Advance the world one fixed step and drain this tick's events.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        // Phase 1: AI decisions over a controller snapshot. Controllers
        // added during the phase are appended back afterwards.
        let mut controllers = mem::take(&mut self.controllers);
        for c in &mut controllers {
            c.update(self);
        }
        let added = mem::replace(&mut self.controllers, controllers);
        self.controllers.extend(added);
        self.reap();

        // Phase 2: pairwise separation, then armed swings.
        self.resolve_separation();
        self.resolve_attacks();
        self.reap();

        // Phase 3: physics and state per actor.
        self.update_actors();

        // Phase 4: decorative animation; canes place their climbers.
        self.terrain.tick();
        self.animate_canes();

        mem::take(&mut self.events)
    }

    /// Push overlapping character pairs one unit apart. Intents are
    /// collected first so the pass reads a consistent snapshot.
    fn resolve_separation(&mut self) {
        let mut pushes: Vec<(ActorId, Vec2)> = Vec::new();
        for i in 0..self.actors.len() {
            let Some(a) = self.actors[i].as_character() else { continue };
            if !a.alive {
                continue;
            }
            for j in (i + 1)..self.actors.len() {
                let Some(b) = self.actors[j].as_character() else { continue };
                if !b.alive || !a.layers.intersects(b.layers) {
                    continue;
                }
                if let Some(push) = combat::separation_push(&a.bounds(), &b.bounds()) {
                    pushes.push((a.id, push));
                    pushes.push((b.id, -push));
                }
            }
        }
        let terrain = &self.terrain;
        for (id, push) in pushes {
            if let Some(c) = actor::find_character_mut(&mut self.actors, id) {
                let p = c.pos() + push;
                c.set_pos(p, terrain);
            }
        }
    }

    fn resolve_attacks(&mut self) {
        let mut swings: Vec<Swing> = Vec::new();
        for a in &mut self.actors {
            let Some(c) = a.as_character_mut() else { continue };
            if !c.attack_pending {
                continue;
            }
            c.attack_pending = false;
            if !c.alive || c.attack_cooldown > 0 {
                continue;
            }
            c.attack_cooldown = self.combat.cooldown + self.combat.recovery;
            let dir = c.looking.unwrap_or(c.facing);
            swings.push(Swing {
                attacker: c.id,
                rect: combat::attack_rect(c.pos(), dir, c.crouching, &self.combat),
                dir,
            });
        }

        for s in swings {
            self.events.push(GameEvent::Sound { id: s.attacker, sound: SoundKey::Swing });
            let victims: Vec<(ActorId, Rect)> = self
                .actors
                .iter()
                .filter_map(Actor::as_character)
                .filter(|c| c.alive && c.id != s.attacker)
                .filter(|c| c.bounds().intersects(&s.rect))
                .map(|c| (c.id, c.bounds()))
                .collect();
            if victims.is_empty() {
                continue;
            }
            let share = victims.len() as f32;
            let damage = self.combat.damage_pool / share;
            let force = Vec2::new(s.dir.sign() * self.combat.knockback / share, 0.0);
            for (victim, bounds) in victims {
                let point = combat::impact_point(&bounds, &s.rect);
                self.events.push(GameEvent::Struck { attacker: s.attacker, victim, point });
                self.hit(victim, point, force, damage);
            }
        }
    }

    fn update_actors(&mut self) {
        let gravity = self.cfg.stats.gravity;
        let mut landed: Vec<ActorId> = Vec::new();
        let terrain = &self.terrain;
        for a in &mut self.actors {
            match a {
                Actor::Character(c) => {
                    if !c.alive {
                        continue;
                    }
                    c.tick_timers();
                    if c.is_climbing() {
                        c.drain_forces();
                    } else {
                        c.integrate(terrain);
                    }
                    let key = c.select_anim();
                    if key != c.anim || c.facing != c.anim_facing {
                        c.anim = key;
                        c.anim_facing = c.facing;
                        self.events.push(GameEvent::AnimationChanged {
                            id: c.id,
                            key,
                            facing: c.facing,
                        });
                    }
                }
                Actor::Spray(s) => {
                    if s.tick(gravity, terrain.height_at(s.pos.x)) {
                        landed.push(s.id);
                    }
                }
                Actor::Cane(_) | Actor::Corpse(_) => {}
            }
        }
        for id in landed {
            self.request_kill(id);
        }
        self.reap();
    }

    /// Tick cane wobble and write the resulting climber placements back
    /// to the characters. Canes never touch characters directly, so the
    /// placements are collected first.
    fn animate_canes(&mut self) {
        let mut placements = Vec::new();
        for a in &mut self.actors {
            if let Actor::Cane(t) = a {
                t.tick();
                placements.extend(t.climber_placements());
            }
        }
        let terrain = &self.terrain;
        for p in placements {
            if let Some(c) = actor::find_character_mut(&mut self.actors, p.actor) {
                c.set_pos(p.pos, terrain);
                c.rotation = p.rotation;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
