//! Configuration management for simulation parameters.
//!
//! Strongly-typed structures that map to a `blockling.toml` file. Every
//! section has defaults, so a file only needs the values it changes.
//!
//! ## Example `blockling.toml`
//!
//! ```toml
//! [physics]
//! interaction_radius = 2.0
//! damping = 0.95
//!
//! [physics.roles.defense]
//! repulsion = 1.2
//! spring = 0.4
//!
//! [pool]
//! max_units_per_type = 4
//! idle_timeout_ms = 60000
//! ```

use blockling_data::{Role, RoleTable};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Per-role force constants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RoleConstants {
    pub repulsion: f64,
    pub spring: f64,
}

/// Physics step parameters.
///
/// `interaction_radius` doubles as the spatial grid cell size, so scanning the
/// adjacent cells always covers every neighbour within range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub interaction_radius: f64,
    pub min_distance: f64,
    pub damping: f64,
    /// Speed cap; `0.0` disables clamping.
    pub max_speed: f64,
    /// Roles missing from a config file keep their default constants.
    #[serde(deserialize_with = "deserialize_roles")]
    pub roles: RoleTable<RoleConstants>,
}

fn deserialize_roles<'de, D>(deserializer: D) -> Result<RoleTable<RoleConstants>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = RoleTable::<Option<RoleConstants>>::deserialize(deserializer)?;
    let mut roles = PhysicsConfig::default().roles;
    for role in Role::ALL {
        if let Some(constants) = overrides[role] {
            roles[role] = constants;
        }
    }
    Ok(roles)
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            interaction_radius: 2.0,
            min_distance: 0.1,
            damping: 0.95,
            max_speed: 25.0,
            roles: RoleTable {
                core: RoleConstants {
                    repulsion: 0.8,
                    spring: 0.6,
                },
                control: RoleConstants {
                    repulsion: 0.6,
                    spring: 0.5,
                },
                movement: RoleConstants {
                    repulsion: 0.4,
                    spring: 0.3,
                },
                defense: RoleConstants {
                    repulsion: 1.0,
                    spring: 0.4,
                },
                attack: RoleConstants {
                    repulsion: 0.5,
                    spring: 0.35,
                },
            },
        }
    }
}

/// Worker pool sizing and lifetime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    pub max_units_per_type: usize,
    pub idle_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_units_per_type: 4,
            idle_timeout_ms: 60_000,
        }
    }
}

impl PoolConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Creature session setup: how many particles of each role to spawn and how
/// large the generated formations are.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Roles left out of a config file spawn no particles.
    pub particle_counts: RoleTable<usize>,
    pub spawn_radius: f64,
    pub formation_radius: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            particle_counts: RoleTable {
                core: 8,
                control: 12,
                movement: 16,
                defense: 12,
                attack: 12,
            },
            spawn_radius: 6.0,
            formation_radius: 5.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub pool: PoolConfig,
    pub session: SessionConfig,
}

impl PhysicsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.interaction_radius.is_finite() && self.interaction_radius > 0.0,
            "Interaction radius must be positive"
        );
        anyhow::ensure!(
            self.min_distance.is_finite() && self.min_distance > 0.0,
            "Minimum distance must be positive"
        );
        anyhow::ensure!(
            self.min_distance < self.interaction_radius,
            "Minimum distance must be smaller than the interaction radius"
        );
        anyhow::ensure!(
            self.damping > 0.0 && self.damping <= 1.0,
            "Damping must be in (0.0, 1.0]"
        );
        anyhow::ensure!(
            self.max_speed.is_finite() && self.max_speed >= 0.0,
            "Max speed must be non-negative"
        );
        for (role, c) in self.roles.iter() {
            anyhow::ensure!(
                c.repulsion.is_finite() && c.repulsion >= 0.0,
                "Repulsion constant for {} must be non-negative",
                role.name()
            );
            anyhow::ensure!(
                c.spring.is_finite() && c.spring >= 0.0,
                "Spring constant for {} must be non-negative",
                role.name()
            );
        }
        Ok(())
    }
}

impl SimConfig {
    /// Validates all configuration parameters, failing on the first rule
    /// that does not hold.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.physics.validate()?;

        anyhow::ensure!(
            self.pool.max_units_per_type > 0,
            "Pool must allow at least one unit per task type"
        );
        anyhow::ensure!(
            self.pool.max_units_per_type <= 256,
            "Pool size too large (max 256 units per task type)"
        );
        anyhow::ensure!(
            self.pool.idle_timeout_ms > 0,
            "Idle timeout must be positive"
        );

        let total: usize = self.session.particle_counts.iter().map(|(_, n)| *n).sum();
        anyhow::ensure!(total <= 100_000, "Too many particles (max 100000)");
        anyhow::ensure!(
            self.session.spawn_radius.is_finite() && self.session.spawn_radius > 0.0,
            "Spawn radius must be positive"
        );
        anyhow::ensure!(
            self.session.formation_radius.is_finite() && self.session.formation_radius > 0.0,
            "Formation radius must be positive"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hash of every setting that influences simulation output. Pool sizing
    /// is excluded because it never changes results.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.physics).as_bytes());
        hasher.update(format!("{:?}", self.session).as_bytes());
        hex::encode(hasher.finalize())
    }
}
