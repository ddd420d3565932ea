//! Grove Fray simulation core.
//!
//! A fixed-step 2D side-scroller world: characters under gravity and
//! ground-contact forces on a piecewise-linear height-field, climbable
//! swaying canes, melee combat with shared damage pools, and opponent
//! AI — all sequenced by [`sim::level::Level::tick`].
//!
//! Rendering, audio, asset loading, level-file parsing and input are
//! external collaborators: they feed the level pre-parsed
//! [`sim::level::LevelDef`] data and action calls, and consume the
//! [`sim::event::GameEvent`] stream plus per-tick position/rotation.

pub mod config;
pub mod domain;
pub mod sim;

pub use config::SimConfig;
pub use domain::actor::{Actor, ActorId, ActorKind, AnimKey, Facing, Team};
pub use domain::ai::{AiController, Strategy};
pub use domain::cane::{Cane, CaneError};
pub use domain::combat::CombatTuning;
pub use domain::geom::{GeomError, Rect, Vec2};
pub use domain::physics::{Character, CharacterStats};
pub use domain::terrain::{Terrain, TerrainError};
pub use sim::event::{GameEvent, SoundKey};
pub use sim::level::{Level, LevelDef, SpawnDef};
pub use sim::resources::ResourceRegistry;
