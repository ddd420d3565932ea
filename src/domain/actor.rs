//! Actor identity and capability composition.
//!
//! Every simulated entity is one `Actor` variant. Capabilities (bounds,
//! climbability, character physics) are queried through accessors on the
//! variant type instead of a class hierarchy: callers ask "does this actor
//! have bounds?" rather than "is this a PhysicalObject subclass?".

use super::cane::Cane;
use super::geom::{Rect, Vec2};
use super::physics::Character;

/// Stable identifier assigned by the level at spawn time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Placeholder carried by actors constructed but not yet spawned.
    pub const UNSPAWNED: ActorId = ActorId(0);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn towards(from: f32, to: f32) -> Facing {
        if from < to {
            Facing::Right
        } else {
            Facing::Left
        }
    }
}

/// Combat allegiance. AI controllers only acquire targets from the
/// opposing team.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Team {
    Player,
    Rival,
}

impl Team {
    pub fn opposes(self, other: Team) -> bool {
        self != other
    }
}

/// Enumerated actor type, used as the resource-registry key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ActorKind {
    Swordsman,
    Raider,
    Cane,
    Corpse,
    BloodSpray,
}

/// Which other actors a body separates against. Masks with no common bit
/// pass through each other.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const DEFAULT: LayerMask = LayerMask(1);

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// Animation-state keys reported to the rendering collaborator. The core
/// only selects them; drawing is someone else's job.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimKey {
    Standing,
    Running,
    Crouching,
    Jumping,
    Falling,
    Climbing,
    SlidingDown,
    Clinging,
    ClingingLookingOut,
    ClingingLookingAcross,
}

// ══════════════════════════════════════════════════════════════
// Non-character actors
// ══════════════════════════════════════════════════════════════

/// Non-physical remains left where a character died.
#[derive(Clone, Debug)]
pub struct Corpse {
    pub id: ActorId,
    /// Graphics set of the character this corpse belonged to.
    pub of: ActorKind,
    pub pos: Vec2,
    pub facing: Facing,
    pub rotation: f32,
}

impl Corpse {
    pub fn new(of: ActorKind, pos: Vec2, facing: Facing) -> Corpse {
        Corpse { id: ActorId::UNSPAWNED, of, pos, facing, rotation: 0.0 }
    }
}

/// Cosmetic impact effect: a short-lived particle that falls under
/// gravity and despawns on ground contact.
#[derive(Clone, Debug)]
pub struct BloodSpray {
    pub id: ActorId,
    pub pos: Vec2,
    pub v: Vec2,
    pub facing: Facing,
    pub rotation: f32,
}

impl BloodSpray {
    pub fn new(pos: Vec2, v: Vec2) -> BloodSpray {
        let facing = if v.x > 0.0 { Facing::Right } else { Facing::Left };
        BloodSpray { id: ActorId::UNSPAWNED, pos, v, facing, rotation: 0.0 }
    }

    /// Advance one tick. Returns true once the spray has landed and
    /// should be removed.
    pub fn tick(&mut self, gravity: Vec2, ground_height: f32) -> bool {
        self.v += gravity;
        self.pos += self.v;
        self.rotation = match self.facing {
            Facing::Right => -self.v.angle_in_degrees(),
            Facing::Left => 180.0 - self.v.angle_in_degrees(),
        };
        self.pos.y <= ground_height
    }
}

// ══════════════════════════════════════════════════════════════
// The actor variant
// ══════════════════════════════════════════════════════════════

pub enum Actor {
    Character(Character),
    Cane(Cane),
    Corpse(Corpse),
    Spray(BloodSpray),
}

impl Actor {
    pub fn id(&self) -> ActorId {
        match self {
            Actor::Character(c) => c.id,
            Actor::Cane(t) => t.id,
            Actor::Corpse(c) => c.id,
            Actor::Spray(s) => s.id,
        }
    }

    pub fn set_id(&mut self, id: ActorId) {
        match self {
            Actor::Character(c) => c.id = id,
            Actor::Cane(t) => t.id = id,
            Actor::Corpse(c) => c.id = id,
            Actor::Spray(s) => s.id = id,
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Character(c) => c.kind,
            Actor::Cane(_) => ActorKind::Cane,
            Actor::Corpse(_) => ActorKind::Corpse,
            Actor::Spray(_) => ActorKind::BloodSpray,
        }
    }

    pub fn pos(&self) -> Vec2 {
        match self {
            Actor::Character(c) => c.pos(),
            Actor::Cane(t) => t.base,
            Actor::Corpse(c) => c.pos,
            Actor::Spray(s) => s.pos,
        }
    }

    pub fn rotation(&self) -> f32 {
        match self {
            Actor::Character(c) => c.rotation,
            Actor::Cane(_) => 0.0,
            Actor::Corpse(c) => c.rotation,
            Actor::Spray(s) => s.rotation,
        }
    }

    /// Collision bounds, for actors that have them.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Actor::Character(c) => Some(c.bounds()),
            _ => None,
        }
    }

    pub fn as_character(&self) -> Option<&Character> {
        match self {
            Actor::Character(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_character_mut(&mut self) -> Option<&mut Character> {
        match self {
            Actor::Character(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cane(&self) -> Option<&Cane> {
        match self {
            Actor::Cane(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cane_mut(&mut self) -> Option<&mut Cane> {
        match self {
            Actor::Cane(t) => Some(t),
            _ => None,
        }
    }
}

// ── Slice lookup helpers ──
//
// The level stores actors in a plain Vec; these free functions keep
// id-keyed lookups borrow-friendly for callers already iterating.

pub fn find(actors: &[Actor], id: ActorId) -> Option<&Actor> {
    actors.iter().find(|a| a.id() == id)
}

pub fn find_character(actors: &[Actor], id: ActorId) -> Option<&Character> {
    find(actors, id).and_then(Actor::as_character)
}

pub fn find_character_mut(actors: &mut [Actor], id: ActorId) -> Option<&mut Character> {
    actors.iter_mut().find(|a| a.id() == id).and_then(Actor::as_character_mut)
}

pub fn find_cane(actors: &[Actor], id: ActorId) -> Option<&Cane> {
    find(actors, id).and_then(Actor::as_cane)
}

pub fn find_cane_mut(actors: &mut [Actor], id: ActorId) -> Option<&mut Cane> {
    actors.iter_mut().find(|a| a.id() == id).and_then(Actor::as_cane_mut)
}
