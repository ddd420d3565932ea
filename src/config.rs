//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD) into the
//! simulation tuning. Falls back to the stock tuning if the file is
//! missing or incomplete.

use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::combat::CombatTuning;
use crate::domain::geom::Vec2;
use crate::domain::physics::CharacterStats;

// ── Public config struct ──

#[derive(Clone, Debug, Default)]
pub struct SimConfig {
    pub stats: CharacterStats,
    pub combat: CombatTuning,
}

// ── TOML schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    combat: TomlCombat,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_mass")]
    mass: f32,
    #[serde(default = "default_friction")]
    friction: f32,
    #[serde(default = "default_damping")]
    linear_damping: f32,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_ground_accel")]
    ground_accel: f32,
    #[serde(default = "default_max_run_speed")]
    max_run_speed: f32,
    #[serde(default = "default_air_accel")]
    air_accel: f32,
    #[serde(default = "default_jump_impulse")]
    jump_impulse: f32,
    #[serde(default = "default_tree_jump_x")]
    tree_jump_x: f32,
    #[serde(default = "default_tree_jump_y")]
    tree_jump_y: f32,
}

#[derive(Deserialize, Debug)]
struct TomlCombat {
    #[serde(default = "default_max_health")]
    max_health: f32,
    #[serde(default = "default_damage_pool")]
    damage_pool: f32,
    #[serde(default = "default_knockback")]
    knockback: f32,
    #[serde(default = "default_reach")]
    reach: f32,
    #[serde(default = "default_swing_height")]
    swing_height: f32,
    #[serde(default = "default_stand_lift")]
    stand_lift: f32,
    #[serde(default = "default_crouch_lift")]
    crouch_lift: f32,
    #[serde(default = "default_cooldown")]
    cooldown: u32,
    #[serde(default = "default_recovery")]
    recovery: u32,
}

// ── Defaults ──

fn default_gravity() -> f32 { -1.6 }
fn default_mass() -> f32 { 15.0 }
fn default_friction() -> f32 { 0.6 }
fn default_damping() -> f32 { 0.0 }

fn default_ground_accel() -> f32 { 10.0 }
fn default_max_run_speed() -> f32 { 15.0 }
fn default_air_accel() -> f32 { 5.0 }
fn default_jump_impulse() -> f32 { 28.0 }
fn default_tree_jump_x() -> f32 { 10.0 }
fn default_tree_jump_y() -> f32 { 15.0 }

fn default_max_health() -> f32 { 100.0 }
fn default_damage_pool() -> f32 { 10.0 }
fn default_knockback() -> f32 { 30.0 }
fn default_reach() -> f32 { 80.0 }
fn default_swing_height() -> f32 { 50.0 }
fn default_stand_lift() -> f32 { 40.0 }
fn default_crouch_lift() -> f32 { 10.0 }
fn default_cooldown() -> u32 { 30 }
fn default_recovery() -> u32 { 6 }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            mass: default_mass(),
            friction: default_friction(),
            linear_damping: default_damping(),
        }
    }
}

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            ground_accel: default_ground_accel(),
            max_run_speed: default_max_run_speed(),
            air_accel: default_air_accel(),
            jump_impulse: default_jump_impulse(),
            tree_jump_x: default_tree_jump_x(),
            tree_jump_y: default_tree_jump_y(),
        }
    }
}

impl Default for TomlCombat {
    fn default() -> Self {
        TomlCombat {
            max_health: default_max_health(),
            damage_pool: default_damage_pool(),
            knockback: default_knockback(),
            reach: default_reach(),
            swing_height: default_swing_height(),
            stand_lift: default_stand_lift(),
            crouch_lift: default_crouch_lift(),
            cooldown: default_cooldown(),
            recovery: default_recovery(),
        }
    }
}

// ── Loading ──

impl SimConfig {
    /// Load from `config.toml`. Search order: (1) exe directory,
    /// (2) current working directory. Missing file or missing keys
    /// gracefully fall back to defaults.
    pub fn load() -> SimConfig {
        SimConfig::from_schema(load_toml(&candidate_dirs()))
    }

    /// Parse tuning from TOML text; missing keys keep their defaults,
    /// and parse errors fall back to the full default tuning.
    pub fn from_toml_str(text: &str) -> SimConfig {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => SimConfig::from_schema(cfg),
            Err(e) => {
                log::warn!("config parse error, using defaults: {e}");
                SimConfig::default()
            }
        }
    }

    fn from_schema(t: TomlConfig) -> SimConfig {
        SimConfig {
            stats: CharacterStats {
                mass: t.physics.mass,
                friction: t.physics.friction,
                linear_damping: t.physics.linear_damping,
                gravity: Vec2::new(0.0, t.physics.gravity),
                ground_accel: t.movement.ground_accel,
                max_run_speed: t.movement.max_run_speed,
                air_accel: t.movement.air_accel,
                jump_impulse: t.movement.jump_impulse,
                tree_jump_impulse: Vec2::new(t.movement.tree_jump_x, t.movement.tree_jump_y),
                max_health: t.combat.max_health,
            },
            combat: CombatTuning {
                reach: t.combat.reach,
                swing_height: t.combat.swing_height,
                stand_lift: t.combat.stand_lift,
                crouch_lift: t.combat.crouch_lift,
                damage_pool: t.combat.damage_pool,
                knockback: t.combat.knockback,
                cooldown: t.combat.cooldown,
                recovery: t.combat.recovery,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        log::warn!("config.toml parse error, using defaults: {e}");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.stats.mass, 15.0);
        assert_eq!(cfg.stats.friction, 0.6);
        assert_eq!(cfg.stats.gravity, Vec2::new(0.0, -1.6));
        assert_eq!(cfg.stats.max_run_speed, 15.0);
        assert_eq!(cfg.stats.jump_impulse, 28.0);
        assert_eq!(cfg.stats.tree_jump_impulse, Vec2::new(10.0, 15.0));
        assert_eq!(cfg.combat.damage_pool, 10.0);
        assert_eq!(cfg.combat.cooldown, 30);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let cfg = SimConfig::from_toml_str(
            "[physics]\nmass = 20.0\n\n[combat]\ndamage_pool = 25.0\n",
        );
        assert_eq!(cfg.stats.mass, 20.0);
        assert_eq!(cfg.combat.damage_pool, 25.0);
        // untouched keys keep their defaults
        assert_eq!(cfg.stats.friction, 0.6);
        assert_eq!(cfg.combat.cooldown, 30);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let cfg = SimConfig::from_toml_str("not [ valid toml");
        assert_eq!(cfg.stats.mass, 15.0);
    }
}
