#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bat Rounds engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative actor pool, and the pure scheduling systems. The scheduler
//! submits [`Command`] values describing desired actor mutations, the pool
//! executes those commands via its `apply` entry point, and every resulting
//! [`Event`] is broadcast to presentation collaborators. Configuration types
//! live alongside the message surface so every crate agrees on one shape.

mod config;

pub use config::{
    ConfigError, Escalation, GameConfig, GameMode, ModeConfig, ModifierWeight, PaceConfig,
    PoolEntry, SceneConfig, SpawnRate, SurpriseModifier, DEFAULT_SEED,
};

use serde::{Deserialize, Serialize};

/// Smallest pool that still leaves one on-screen slot after the reserved headroom.
pub const MIN_POOL_CAPACITY: usize = ON_SCREEN_HEADROOM + 1;

/// Number of pooled actors that are never counted toward the on-screen cap.
pub const ON_SCREEN_HEADROOM: usize = 2;

/// Label used to derive the spawn placement random stream.
pub const RNG_STREAM_PLACEMENT: &str = "placement";

/// Label used to derive the per-round pace random stream.
pub const RNG_STREAM_PACE: &str = "pace";

/// Label used to derive the modifier drop random stream.
pub const RNG_STREAM_DROPS: &str = "drops";

/// Label used to derive the surprise modifier random stream.
pub const RNG_STREAM_SURPRISE: &str = "surprise";

/// Commands that express all permissible actor pool mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves an inactive actor on screen at the provided spawn point.
    ActivateActor {
        /// Pooled actor that should become active.
        actor: ActorId,
        /// Location the actor appears at.
        position: SpawnPoint,
        /// Movement speed applied to the actor.
        speed: f32,
        /// Uniform scale applied to the actor.
        scale: f32,
    },
    /// Reports that an active actor ran out of time and started fleeing.
    BeginFlee {
        /// Actor that started fleeing.
        actor: ActorId,
    },
    /// Resolves an on-screen actor after it was stunned or escaped.
    ResolveActor {
        /// Actor being resolved.
        actor: ActorId,
        /// How the actor left play.
        outcome: Outcome,
    },
    /// Returns a resolving actor to the pool, releasing its on-screen slot.
    DeactivateActor {
        /// Actor being returned to the pool.
        actor: ActorId,
    },
    /// Rewrites the cosmetic pace values carried by an actor.
    SetActorPace {
        /// Actor receiving the new values.
        actor: ActorId,
        /// Movement speed applied to the actor.
        speed: f32,
        /// Uniform scale applied to the actor.
        scale: f32,
    },
}

/// Events broadcast to presentation collaborators after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that a pooled actor was placed on screen.
    ActorActivated {
        /// Actor that became active.
        actor: ActorId,
        /// Fixed kind of the actor.
        kind: ActorKind,
        /// Location the actor appears at.
        position: SpawnPoint,
        /// Movement speed applied to the actor.
        speed: f32,
        /// Uniform scale applied to the actor.
        scale: f32,
    },
    /// Confirms that an actor started fleeing.
    ActorFleeing {
        /// Actor that started fleeing.
        actor: ActorId,
    },
    /// Confirms that an actor left play.
    ActorResolved {
        /// Actor that was resolved.
        actor: ActorId,
        /// Fixed kind of the actor.
        kind: ActorKind,
        /// How the actor left play.
        outcome: Outcome,
    },
    /// Confirms that an actor returned to the pool.
    ActorDeactivated {
        /// Actor that returned to the pool.
        actor: ActorId,
    },
    /// Announces fresh cosmetic pace values for an actor.
    ActorPaceChanged {
        /// Actor receiving the new values.
        actor: ActorId,
        /// Movement speed applied to the actor.
        speed: f32,
        /// Uniform scale applied to the actor.
        scale: f32,
    },
    /// Reports that the pool refused an actor transition.
    TransitionRejected {
        /// Actor named in the rejected command.
        actor: ActorId,
        /// Specific reason the transition failed.
        reason: TransitionError,
    },
    /// Announces that a new round started.
    RoundAdvanced {
        /// One-based number of the round that just started.
        round: u32,
    },
    /// Announces that the final round was completed. No further events follow.
    GameOver {
        /// Round that was completed last.
        round: u32,
        /// Number of resolutions recorded over the whole game.
        total_stuns: u32,
    },
    /// Announces that a modifier actor dropped a buff or debuff.
    ModifierDropped {
        /// Actor that dropped the modifier.
        actor: ActorId,
        /// Modifier selected for the drop.
        modifier: ModifierKind,
        /// Location the drop appears at.
        position: SpawnPoint,
    },
}

/// Identifier of a pooled actor. Doubles as its stable index in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the actor inside the pool.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Kinds of pooled actors. An actor's kind is fixed when the pool is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// Default target without special behaviour.
    Regular,
    /// Target worth a large score bonus.
    HighBonus,
    /// Target worth a small score bonus.
    LowBonus,
    /// Target that drops a buff or debuff when stunned.
    Modifier,
    /// Target whose stun chains into nearby targets.
    Unstable,
    /// Target that charges and dives at structures.
    DiveBomb,
}

impl ActorKind {
    /// Every actor kind in declaration order.
    pub const ALL: [ActorKind; 6] = [
        ActorKind::Regular,
        ActorKind::HighBonus,
        ActorKind::LowBonus,
        ActorKind::Modifier,
        ActorKind::Unstable,
        ActorKind::DiveBomb,
    ];

    /// Reports whether the kind is the plain default target.
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Regular)
    }
}

/// Activation lifecycle of a pooled actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationState {
    /// Parked in the pool and available for spawning.
    Inactive,
    /// On screen and waiting to be hit.
    Active,
    /// On screen and escaping.
    Fleeing,
    /// Hit or escaped, waiting to be returned to the pool.
    Resolving,
}

impl ActivationState {
    /// Reports whether an actor in this state holds an on-screen slot.
    #[must_use]
    pub const fn occupies_slot(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

/// How an actor left play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The player hit the actor.
    Stunned,
    /// The actor escaped before being hit.
    Fled,
}

/// Buffs and debuffs that modifier actors can drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Doubles points earned while active.
    DoublePoints,
    /// Widens the player's hit area.
    Overcharge,
    /// Stuns every on-screen actor at once.
    Emp,
    /// Slows the player's crosshair.
    Snail,
    /// Inverts the player's controls.
    Confusion,
    /// Slows the player's fire rate.
    RustedWings,
}

impl ModifierKind {
    /// Reports whether the modifier helps the player.
    #[must_use]
    pub const fn is_buff(self) -> bool {
        matches!(self, Self::DoublePoints | Self::Overcharge | Self::Emp)
    }

    /// Reports whether the modifier hinders the player.
    #[must_use]
    pub const fn is_debuff(self) -> bool {
        !self.is_buff()
    }
}

/// Position at which actors may appear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    x: f32,
    y: f32,
}

impl SpawnPoint {
    /// Creates a spawn point from world coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Reasons the pool may refuse an actor transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionError {
    /// No actor with the provided identifier exists.
    UnknownActor,
    /// The actor is already on screen.
    NotInactive,
    /// The actor is not active or fleeing.
    NotOnScreen,
    /// The actor has not been resolved yet.
    NotResolving,
}

/// Immutable representation of a single actor used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    /// Identifier of the actor.
    pub id: ActorId,
    /// Fixed kind of the actor.
    pub kind: ActorKind,
    /// Current activation state.
    pub state: ActivationState,
    /// Location of the most recent spawn, if the actor was ever spawned.
    pub position: Option<SpawnPoint>,
    /// Current movement speed.
    pub speed: f32,
    /// Current uniform scale.
    pub scale: f32,
}

/// Read-only snapshot describing every pooled actor.
#[derive(Clone, Debug, Default)]
pub struct ActorView {
    snapshots: Vec<ActorSnapshot>,
}

impl ActorView {
    /// Creates a new actor view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ActorSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the actors that currently hold an on-screen slot.
    pub fn on_screen(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.state.occupies_slot())
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ActorSnapshot> {
        self.snapshots
    }
}
