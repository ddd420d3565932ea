//! Events emitted during a simulation tick.
//! The presentation collaborators (rendering, audio, asset loading)
//! consume these; the core never draws or plays anything itself.

use crate::domain::actor::{ActorId, ActorKind, AnimKey, Facing};
use crate::domain::geom::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SoundKey {
    Jump,
    Swing,
    Hit,
    Death,
}

#[derive(Clone, Debug)]
pub enum GameEvent {
    /// First actor of this kind spawned; the asset collaborator should
    /// load its resource batch now.
    ResourcesRequested { kind: ActorKind },
    Spawned { id: ActorId, kind: ActorKind },
    Removed { id: ActorId },
    AnimationChanged { id: ActorId, key: AnimKey, facing: Facing },
    Sound { id: ActorId, sound: SoundKey },
    /// A swing connected; one record per victim.
    Struck { attacker: ActorId, victim: ActorId, point: Vec2 },
    Died { id: ActorId, corpse: ActorId },
}
