//! Configuration surface loaded once at startup and treated as read-only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActorKind, ModifierKind, SpawnPoint, MIN_POOL_CAPACITY};

/// Seed used when a configuration does not name one.
pub const DEFAULT_SEED: u64 = 0x30b4_75ee_d2c1_9a33;

/// Game modes with their own escalation curve and eligibility rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Single-player mode with a short, steep escalation curve.
    Classic,
    /// Shared-screen mode with longer rounds and surprise modifier actors.
    Cooperative,
}

impl GameMode {
    /// Built-in rules for the mode.
    #[must_use]
    pub fn default_rules(self) -> ModeConfig {
        match self {
            Self::Classic => ModeConfig::classic(),
            Self::Cooperative => ModeConfig::cooperative(),
        }
    }
}

/// Complete configuration required to build a scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Mode whose policy drives the rounds.
    pub mode: GameMode,
    /// Seed from which every random stream is derived.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Pool composition and spawn locations.
    #[serde(default)]
    pub scene: SceneConfig,
    /// Round rules for the selected mode.
    pub rules: ModeConfig,
}

impl GameConfig {
    /// Creates the built-in configuration for the provided mode.
    #[must_use]
    pub fn for_mode(mode: GameMode) -> Self {
        Self {
            mode,
            seed: DEFAULT_SEED,
            scene: SceneConfig::default(),
            rules: mode.default_rules(),
        }
    }

    /// Checks every section, reporting the first fault found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scene.validate()?;
        self.rules.validate()?;
        self.scene.validate_against(&self.rules)
    }
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Number of pooled actors of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Kind shared by the actors.
    pub kind: ActorKind,
    /// Number of actors of that kind.
    pub count: u32,
}

/// Fixed scene layout: which actors exist and where they may appear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Pool composition in pool order.
    pub pool: Vec<PoolEntry>,
    /// Locations sampled uniformly whenever an actor spawns.
    pub spawn_points: Vec<SpawnPoint>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pool: vec![
                PoolEntry {
                    kind: ActorKind::Regular,
                    count: 12,
                },
                PoolEntry {
                    kind: ActorKind::HighBonus,
                    count: 2,
                },
                PoolEntry {
                    kind: ActorKind::LowBonus,
                    count: 2,
                },
                PoolEntry {
                    kind: ActorKind::Modifier,
                    count: 2,
                },
                PoolEntry {
                    kind: ActorKind::Unstable,
                    count: 2,
                },
                PoolEntry {
                    kind: ActorKind::DiveBomb,
                    count: 2,
                },
            ],
            spawn_points: vec![
                SpawnPoint::new(-9.0, 3.5),
                SpawnPoint::new(-5.0, 6.0),
                SpawnPoint::new(0.0, 7.0),
                SpawnPoint::new(5.0, 6.0),
                SpawnPoint::new(9.0, 3.5),
                SpawnPoint::new(0.0, -3.0),
            ],
        }
    }
}

impl SceneConfig {
    /// Total number of pooled actors.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.iter().map(|entry| entry.count as usize).sum()
    }

    /// Expands the pool composition into one kind per actor, in pool order.
    #[must_use]
    pub fn actor_kinds(&self) -> Vec<ActorKind> {
        self.pool
            .iter()
            .flat_map(|entry| std::iter::repeat(entry.kind).take(entry.count as usize))
            .collect()
    }

    /// Checks that the pool can sustain play and that actors have somewhere to appear.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.capacity();
        if capacity < MIN_POOL_CAPACITY {
            return Err(ConfigError::PoolTooSmall {
                capacity,
                minimum: MIN_POOL_CAPACITY,
            });
        }
        if self.spawn_points.is_empty() {
            return Err(ConfigError::NoSpawnPoints);
        }
        Ok(())
    }

    /// Checks that the pool can serve the fallback spawn of the given rules.
    ///
    /// Outside debug selection the fallback only ever spawns default-kind
    /// actors, so a pool without one would leave every round empty.
    pub fn validate_against(&self, rules: &ModeConfig) -> Result<(), ConfigError> {
        let has_default = self
            .pool
            .iter()
            .any(|entry| entry.kind.is_default() && entry.count > 0);
        if !rules.debug && !has_default {
            return Err(ConfigError::NoDefaultActor);
        }
        Ok(())
    }
}

/// Stun-count cadence at which a special actor kind gains a spawn credit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRate {
    /// Special kind that gains the credit.
    pub kind: ActorKind,
    /// A credit is granted whenever the total stun count is a multiple of this value.
    pub rate: u32,
}

/// Relative chance that a modifier actor drops the given modifier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierWeight {
    /// Modifier enabled for the mode.
    pub kind: ModifierKind,
    /// Non-negative relative weight.
    pub weight: f32,
}

/// Per-round increments applied when a round completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    /// Added to the number of resolutions a round requires.
    pub target_increment: u32,
    /// Added to the on-screen cap before clamping it to the pool headroom.
    pub cap_increment: u32,
}

/// Cosmetic speed and scale ranges rerolled every round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaceConfig {
    /// Lower speed bound in the first round.
    pub min_speed: f32,
    /// Upper speed bound in the first round.
    pub max_speed: f32,
    /// Amount both speed bounds rise per round.
    pub speed_step: f32,
    /// Highest value the lower speed bound may reach.
    pub min_speed_ceiling: f32,
    /// Highest value the upper speed bound may reach.
    pub max_speed_ceiling: f32,
    /// Lower scale bound.
    pub min_scale: f32,
    /// Upper scale bound.
    pub max_scale: f32,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            min_speed: 3.0,
            max_speed: 3.5,
            speed_step: 0.5,
            min_speed_ceiling: 7.5,
            max_speed_ceiling: 8.0,
            min_scale: 2.8,
            max_scale: 3.5,
        }
    }
}

impl PaceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("speed", self.min_speed, self.max_speed)?;
        check_range("speed ceiling", self.min_speed_ceiling, self.max_speed_ceiling)?;
        check_range("scale", self.min_scale, self.max_scale)?;
        if !self.speed_step.is_finite() || self.speed_step < 0.0 {
            return Err(ConfigError::InvalidRange {
                name: "speed step",
                min: self.speed_step,
                max: self.speed_step,
            });
        }
        Ok(())
    }
}

fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { name, min, max })
    }
}

/// Flat chance, checked every few resolutions, of inserting a modifier actor mid-round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurpriseModifier {
    /// The roll happens whenever the total stun count is a multiple of this value.
    pub interval: u32,
    /// Probability in `0.0..=1.0` that a roll succeeds.
    pub chance: f64,
}

impl Default for SurpriseModifier {
    fn default() -> Self {
        Self {
            interval: 5,
            chance: 0.3,
        }
    }
}

/// Round rules for one game mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Number of rounds; completing the last one ends the game.
    pub num_rounds: u32,
    /// Resolutions required to finish the first round.
    pub initial_target_count: u32,
    /// On-screen cap during the first round, before clamping to the pool headroom.
    pub initial_max_on_screen: u32,
    /// Actor kinds the mode may spawn through regular selection.
    pub eligible: BTreeSet<ActorKind>,
    /// Unlock cadences in priority order.
    pub unlock_rates: Vec<SpawnRate>,
    /// Enabled modifiers and their drop weights, in sampling order.
    pub modifier_weights: Vec<ModifierWeight>,
    /// Per-round increments.
    pub escalation: Escalation,
    /// Cosmetic speed and scale ranges.
    #[serde(default)]
    pub pace: PaceConfig,
    /// Whether a modifier actor is force-spawned whenever a new round starts.
    pub round_start_modifier: bool,
    /// Mid-round modifier roll used by the cooperative policy.
    #[serde(default)]
    pub surprise_modifier: Option<SurpriseModifier>,
    /// Bypasses every eligibility filter when selecting actors.
    #[serde(default)]
    pub debug: bool,
}

impl ModeConfig {
    /// Built-in rules for [`GameMode::Classic`].
    #[must_use]
    pub fn classic() -> Self {
        Self {
            num_rounds: 10,
            initial_target_count: 5,
            initial_max_on_screen: 8,
            eligible: [
                ActorKind::Regular,
                ActorKind::HighBonus,
                ActorKind::LowBonus,
                ActorKind::Modifier,
                ActorKind::Unstable,
            ]
            .into_iter()
            .collect(),
            unlock_rates: vec![
                SpawnRate {
                    kind: ActorKind::HighBonus,
                    rate: 10,
                },
                SpawnRate {
                    kind: ActorKind::LowBonus,
                    rate: 4,
                },
                SpawnRate {
                    kind: ActorKind::Unstable,
                    rate: 7,
                },
            ],
            modifier_weights: vec![
                ModifierWeight {
                    kind: ModifierKind::DoublePoints,
                    weight: 0.5,
                },
                ModifierWeight {
                    kind: ModifierKind::Overcharge,
                    weight: 0.5,
                },
            ],
            escalation: Escalation {
                target_increment: 2,
                cap_increment: 1,
            },
            pace: PaceConfig::default(),
            round_start_modifier: true,
            surprise_modifier: None,
            debug: false,
        }
    }

    /// Built-in rules for [`GameMode::Cooperative`].
    #[must_use]
    pub fn cooperative() -> Self {
        Self {
            num_rounds: 15,
            initial_target_count: 8,
            initial_max_on_screen: 15,
            eligible: [
                ActorKind::Regular,
                ActorKind::HighBonus,
                ActorKind::LowBonus,
                ActorKind::Unstable,
                ActorKind::DiveBomb,
            ]
            .into_iter()
            .collect(),
            unlock_rates: vec![
                SpawnRate {
                    kind: ActorKind::HighBonus,
                    rate: 3,
                },
                SpawnRate {
                    kind: ActorKind::DiveBomb,
                    rate: 8,
                },
            ],
            modifier_weights: vec![
                ModifierWeight {
                    kind: ModifierKind::DoublePoints,
                    weight: 0.25,
                },
                ModifierWeight {
                    kind: ModifierKind::Overcharge,
                    weight: 0.2,
                },
                ModifierWeight {
                    kind: ModifierKind::Emp,
                    weight: 0.1,
                },
                ModifierWeight {
                    kind: ModifierKind::Snail,
                    weight: 0.15,
                },
                ModifierWeight {
                    kind: ModifierKind::Confusion,
                    weight: 0.15,
                },
                ModifierWeight {
                    kind: ModifierKind::RustedWings,
                    weight: 0.15,
                },
            ],
            escalation: Escalation {
                target_increment: 4,
                cap_increment: 1,
            },
            pace: PaceConfig::default(),
            round_start_modifier: true,
            surprise_modifier: Some(SurpriseModifier::default()),
            debug: false,
        }
    }

    /// Reports whether regular selection may spawn the provided kind.
    #[must_use]
    pub fn is_eligible(&self, kind: ActorKind) -> bool {
        self.eligible.contains(&kind)
    }

    /// Checks the rules for faults that would break scheduling at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.initial_target_count == 0 {
            return Err(ConfigError::ZeroTargetCount);
        }
        if self.initial_max_on_screen == 0 {
            return Err(ConfigError::ZeroOnScreenCap);
        }

        let mut seen = BTreeSet::new();
        for entry in &self.unlock_rates {
            if entry.rate == 0 {
                return Err(ConfigError::ZeroUnlockRate { kind: entry.kind });
            }
            if !seen.insert(entry.kind) {
                return Err(ConfigError::DuplicateUnlockRate { kind: entry.kind });
            }
        }

        if self.modifier_weights.is_empty() {
            return Err(ConfigError::EmptyWeightTable);
        }
        for entry in &self.modifier_weights {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(ConfigError::InvalidModifierWeight {
                    kind: entry.kind,
                    weight: entry.weight,
                });
            }
        }
        if !self
            .modifier_weights
            .iter()
            .any(|entry| entry.kind.is_buff())
        {
            return Err(ConfigError::NoBuffEnabled);
        }

        self.pace.validate()?;

        if let Some(surprise) = self.surprise_modifier {
            if surprise.interval == 0 {
                return Err(ConfigError::ZeroSurpriseInterval);
            }
            if !(0.0..=1.0).contains(&surprise.chance) {
                return Err(ConfigError::InvalidSurpriseChance {
                    chance: surprise.chance,
                });
            }
        }

        Ok(())
    }
}

/// Configuration faults detected before a scheduler is built. All are fatal to startup.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A weighted choice was requested over an empty weight list.
    #[error("weight table is empty")]
    EmptyWeightTable,
    /// A raw weight handed to the sampler was negative or not finite.
    #[error("weight {weight} at index {index} is not a finite non-negative number")]
    InvalidWeight {
        /// Position of the offending weight.
        index: usize,
        /// Offending value.
        weight: f32,
    },
    /// A configured modifier weight was negative or not finite.
    #[error("modifier {kind:?} has invalid weight {weight}")]
    InvalidModifierWeight {
        /// Modifier carrying the weight.
        kind: ModifierKind,
        /// Offending value.
        weight: f32,
    },
    /// The mode enables only debuffs, so drops could be empty while a debuff runs.
    #[error("mode enables no buff modifier")]
    NoBuffEnabled,
    /// An unlock cadence of zero would divide by zero.
    #[error("unlock rate for {kind:?} is zero")]
    ZeroUnlockRate {
        /// Kind configured with the zero rate.
        kind: ActorKind,
    },
    /// The same kind appears twice in the unlock table.
    #[error("unlock rate for {kind:?} is listed more than once")]
    DuplicateUnlockRate {
        /// Kind listed twice.
        kind: ActorKind,
    },
    /// The pool cannot keep the on-screen headroom.
    #[error("pool capacity {capacity} is below the minimum of {minimum}")]
    PoolTooSmall {
        /// Configured number of actors.
        capacity: usize,
        /// Smallest supported number of actors.
        minimum: usize,
    },
    /// No spawn locations were configured.
    #[error("scene has no spawn points")]
    NoSpawnPoints,
    /// The pool holds no default-kind actor for fallback spawns.
    #[error("scene pool has no default-kind actor")]
    NoDefaultActor,
    /// The mode has no rounds to play.
    #[error("mode must run at least one round")]
    ZeroRounds,
    /// The first round would complete without any resolution.
    #[error("first round target count must be non-zero")]
    ZeroTargetCount,
    /// Nothing could ever be on screen.
    #[error("first round on-screen cap must be non-zero")]
    ZeroOnScreenCap,
    /// A numeric range is empty, inverted, or not finite.
    #[error("{name} range {min}..={max} is invalid")]
    InvalidRange {
        /// Name of the range.
        name: &'static str,
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },
    /// The surprise roll would never happen.
    #[error("surprise modifier interval is zero")]
    ZeroSurpriseInterval,
    /// The surprise roll probability is not a probability.
    #[error("surprise modifier chance {chance} is outside 0..=1")]
    InvalidSurpriseChance {
        /// Offending value.
        chance: f64,
    },
}
