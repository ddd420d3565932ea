//! Pure simulation domain: geometry, terrain, bodies, canes, combat, AI.

pub mod actor;
pub mod ai;
pub mod cane;
pub mod combat;
pub mod geom;
pub mod physics;
pub mod terrain;
