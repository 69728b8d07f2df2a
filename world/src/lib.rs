#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative actor pool for Bat Rounds.
//!
//! The pool is built once from the scene layout and never grows or shrinks.
//! Actors are only ever moved between activation states through [`apply`],
//! which reports every accepted or rejected transition as an [`Event`].

use bat_rounds_core::{
    ActivationState, ActorId, ActorKind, Command, Event, SpawnPoint, TransitionError,
};

const INITIAL_SPEED: f32 = 1.0;
const INITIAL_SCALE: f32 = 1.0;

/// Fixed-capacity collection of reusable target actors.
#[derive(Debug)]
pub struct ActorPool {
    actors: Vec<Actor>,
    on_screen: usize,
}

impl ActorPool {
    /// Creates a pool holding one inactive actor per provided kind, in order.
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = ActorKind>) -> Self {
        let actors = kinds
            .into_iter()
            .enumerate()
            .map(|(index, kind)| Actor::parked(ActorId::new(index as u32), kind))
            .collect();
        Self {
            actors,
            on_screen: 0,
        }
    }
}

#[derive(Clone, Debug)]
struct Actor {
    id: ActorId,
    kind: ActorKind,
    state: ActivationState,
    position: Option<SpawnPoint>,
    speed: f32,
    scale: f32,
}

impl Actor {
    fn parked(id: ActorId, kind: ActorKind) -> Self {
        Self {
            id,
            kind,
            state: ActivationState::Inactive,
            position: None,
            speed: INITIAL_SPEED,
            scale: INITIAL_SCALE,
        }
    }
}

/// Applies the provided command to the pool, mutating actor state deterministically.
pub fn apply(pool: &mut ActorPool, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ActivateActor {
            actor,
            position,
            speed,
            scale,
        } => {
            let Some(entry) = pool.actors.get_mut(actor.index()) else {
                reject(actor, TransitionError::UnknownActor, out_events);
                return;
            };
            if entry.state != ActivationState::Inactive {
                reject(actor, TransitionError::NotInactive, out_events);
                return;
            }

            entry.state = ActivationState::Active;
            entry.position = Some(position);
            entry.speed = speed;
            entry.scale = scale;
            pool.on_screen += 1;
            out_events.push(Event::ActorActivated {
                actor,
                kind: entry.kind,
                position,
                speed,
                scale,
            });
        }
        Command::BeginFlee { actor } => {
            let Some(entry) = pool.actors.get_mut(actor.index()) else {
                reject(actor, TransitionError::UnknownActor, out_events);
                return;
            };
            if entry.state != ActivationState::Active {
                reject(actor, TransitionError::NotOnScreen, out_events);
                return;
            }

            entry.state = ActivationState::Fleeing;
            out_events.push(Event::ActorFleeing { actor });
        }
        Command::ResolveActor { actor, outcome } => {
            let Some(entry) = pool.actors.get_mut(actor.index()) else {
                reject(actor, TransitionError::UnknownActor, out_events);
                return;
            };
            if !matches!(
                entry.state,
                ActivationState::Active | ActivationState::Fleeing
            ) {
                reject(actor, TransitionError::NotOnScreen, out_events);
                return;
            }

            entry.state = ActivationState::Resolving;
            out_events.push(Event::ActorResolved {
                actor,
                kind: entry.kind,
                outcome,
            });
        }
        Command::DeactivateActor { actor } => {
            let Some(entry) = pool.actors.get_mut(actor.index()) else {
                reject(actor, TransitionError::UnknownActor, out_events);
                return;
            };
            if entry.state != ActivationState::Resolving {
                reject(actor, TransitionError::NotResolving, out_events);
                return;
            }

            entry.state = ActivationState::Inactive;
            pool.on_screen = pool.on_screen.saturating_sub(1);
            out_events.push(Event::ActorDeactivated { actor });
        }
        Command::SetActorPace {
            actor,
            speed,
            scale,
        } => {
            let Some(entry) = pool.actors.get_mut(actor.index()) else {
                reject(actor, TransitionError::UnknownActor, out_events);
                return;
            };

            entry.speed = speed;
            entry.scale = scale;
            out_events.push(Event::ActorPaceChanged {
                actor,
                speed,
                scale,
            });
        }
    }
}

fn reject(actor: ActorId, reason: TransitionError, out_events: &mut Vec<Event>) {
    out_events.push(Event::TransitionRejected { actor, reason });
}

/// Query functions that provide read-only access to the pool.
pub mod query {
    use super::ActorPool;
    use bat_rounds_core::{
        ActivationState, ActorId, ActorKind, ActorSnapshot, ActorView, SpawnPoint,
    };

    /// Total number of pooled actors. Constant for the lifetime of the pool.
    #[must_use]
    pub fn capacity(pool: &ActorPool) -> usize {
        pool.actors.len()
    }

    /// Number of actors currently holding an on-screen slot.
    #[must_use]
    pub fn active_count(pool: &ActorPool) -> usize {
        pool.on_screen
    }

    /// First inactive actor in pool order.
    #[must_use]
    pub fn find_inactive(pool: &ActorPool) -> Option<ActorId> {
        find_inactive_matching(pool, |_| true)
    }

    /// First inactive actor in pool order whose kind satisfies the predicate.
    #[must_use]
    pub fn find_inactive_matching(
        pool: &ActorPool,
        mut predicate: impl FnMut(ActorKind) -> bool,
    ) -> Option<ActorId> {
        pool.actors
            .iter()
            .find(|actor| actor.state == ActivationState::Inactive && predicate(actor.kind))
            .map(|actor| actor.id)
    }

    /// Every actor's identifier, kind and state in pool order.
    pub fn roster(
        pool: &ActorPool,
    ) -> impl Iterator<Item = (ActorId, ActorKind, ActivationState)> + '_ {
        pool.actors
            .iter()
            .map(|actor| (actor.id, actor.kind, actor.state))
    }

    /// Fixed kind of the actor, if it exists.
    #[must_use]
    pub fn kind(pool: &ActorPool, actor: ActorId) -> Option<ActorKind> {
        pool.actors.get(actor.index()).map(|entry| entry.kind)
    }

    /// Current activation state of the actor, if it exists.
    #[must_use]
    pub fn state(pool: &ActorPool, actor: ActorId) -> Option<ActivationState> {
        pool.actors.get(actor.index()).map(|entry| entry.state)
    }

    /// Location of the actor's most recent spawn.
    #[must_use]
    pub fn position(pool: &ActorPool, actor: ActorId) -> Option<SpawnPoint> {
        pool.actors
            .get(actor.index())
            .and_then(|entry| entry.position)
    }

    /// Speed and scale currently carried by the actor.
    #[must_use]
    pub fn pace(pool: &ActorPool, actor: ActorId) -> Option<(f32, f32)> {
        pool.actors
            .get(actor.index())
            .map(|entry| (entry.speed, entry.scale))
    }

    /// Captures a read-only view of every pooled actor.
    #[must_use]
    pub fn actor_view(pool: &ActorPool) -> ActorView {
        let snapshots = pool
            .actors
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id,
                kind: actor.kind,
                state: actor.state,
                position: actor.position,
                speed: actor.speed,
                scale: actor.scale,
            })
            .collect();
        ActorView::from_snapshots(snapshots)
    }
}
