//! Borrowed view of the scheduler state that policies operate on.

use bat_rounds_core::{
    ActivationState, ActorId, ActorKind, Command, Event, PaceConfig, SpawnPoint,
    RNG_STREAM_PACE, RNG_STREAM_PLACEMENT, RNG_STREAM_SURPRISE,
};
use bat_rounds_system_sampling::stream_rng;
use bat_rounds_system_unlocks::UnlockCounters;
use bat_rounds_world::{self as world, query, ActorPool};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::RoundState;

/// Random streams consumed while running rounds.
#[derive(Clone, Debug)]
pub struct RoundStreams {
    placement: ChaCha8Rng,
    pace: ChaCha8Rng,
    surprise: ChaCha8Rng,
}

impl RoundStreams {
    /// Derives every round stream from the global seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            placement: stream_rng(seed, RNG_STREAM_PLACEMENT),
            pace: stream_rng(seed, RNG_STREAM_PACE),
            surprise: stream_rng(seed, RNG_STREAM_SURPRISE),
        }
    }
}

/// Mutable access to everything a round policy touches while handling one notification.
#[derive(Debug)]
pub struct RoundContext<'a> {
    pub(crate) pool: &'a mut ActorPool,
    pub(crate) unlocks: &'a mut UnlockCounters,
    pub(crate) round: &'a mut RoundState,
    streams: &'a mut RoundStreams,
    spawn_points: &'a [SpawnPoint],
    out: &'a mut Vec<Event>,
}

impl<'a> RoundContext<'a> {
    /// Bundles the scheduler state for a single policy call.
    pub fn new(
        pool: &'a mut ActorPool,
        unlocks: &'a mut UnlockCounters,
        round: &'a mut RoundState,
        streams: &'a mut RoundStreams,
        spawn_points: &'a [SpawnPoint],
        out: &'a mut Vec<Event>,
    ) -> Self {
        Self {
            pool,
            unlocks,
            round,
            streams,
            spawn_points,
            out,
        }
    }

    /// Read-only access to the actor pool.
    #[must_use]
    pub fn pool(&self) -> &ActorPool {
        &*self.pool
    }

    /// Read-only access to the round bookkeeping.
    #[must_use]
    pub fn round(&self) -> &RoundState {
        &*self.round
    }

    /// Mutable access to the round bookkeeping.
    pub fn round_mut(&mut self) -> &mut RoundState {
        &mut *self.round
    }

    /// Mutable access to the spawn credits.
    pub fn unlocks_mut(&mut self) -> &mut UnlockCounters {
        &mut *self.unlocks
    }

    /// Number of actors currently holding an on-screen slot.
    #[must_use]
    pub fn active_count(&self) -> usize {
        query::active_count(self.pool)
    }

    /// Total number of pooled actors.
    #[must_use]
    pub fn capacity(&self) -> usize {
        query::capacity(self.pool)
    }

    /// Reports whether the on-screen cap of the current round is reached.
    #[must_use]
    pub fn at_cap(&self) -> bool {
        self.active_count() >= self.round.max_concurrent_on_screen() as usize
    }

    /// Places an inactive actor at a random spawn point using its current pace.
    ///
    /// Returns `false` without touching the pool when the actor is not inactive.
    pub fn spawn(&mut self, actor: ActorId) -> bool {
        if query::state(self.pool, actor) != Some(ActivationState::Inactive) {
            return false;
        }
        let Some((speed, scale)) = query::pace(self.pool, actor) else {
            return false;
        };
        let Some(position) = self.pick_spawn_point() else {
            return false;
        };

        world::apply(
            self.pool,
            Command::ActivateActor {
                actor,
                position,
                speed,
                scale,
            },
            self.out,
        );
        debug!(
            actor = actor.get(),
            x = position.x(),
            y = position.y(),
            "actor_spawned"
        );
        true
    }

    /// Spawns the first inactive default-kind actor, if any.
    pub fn spawn_default(&mut self) -> bool {
        match query::find_inactive_matching(self.pool, ActorKind::is_default) {
            Some(actor) => self.spawn(actor),
            None => false,
        }
    }

    /// Spawns the first inactive actor of `kind`, if any.
    pub fn spawn_kind(&mut self, kind: ActorKind) -> bool {
        match query::find_inactive_matching(self.pool, |candidate| candidate == kind) {
            Some(actor) => self.spawn(actor),
            None => false,
        }
    }

    /// Rolls fresh speed and scale for every pooled actor from the current range.
    pub fn reroll_pace(&mut self, pace: &PaceConfig) {
        let (min_speed, max_speed) = self.round.speed_range();
        for index in 0..query::capacity(self.pool) {
            let actor = ActorId::new(index as u32);
            let speed = sample_between(&mut self.streams.pace, min_speed, max_speed);
            let scale = sample_between(&mut self.streams.pace, pace.min_scale, pace.max_scale);
            world::apply(
                self.pool,
                Command::SetActorPace {
                    actor,
                    speed,
                    scale,
                },
                self.out,
            );
        }
    }

    /// Runs a Bernoulli trial on the surprise stream.
    pub fn roll_surprise(&mut self, chance: f64) -> bool {
        self.streams.surprise.gen::<f64>() < chance
    }

    /// Broadcasts that the current round just started.
    pub fn announce_round(&mut self) {
        self.out.push(Event::RoundAdvanced {
            round: self.round.current_round(),
        });
        info!(
            round = self.round.current_round(),
            target = self.round.target_count_needed(),
            cap = self.round.max_concurrent_on_screen(),
            "round_advanced"
        );
    }

    /// Marks the game as finished and broadcasts it.
    pub fn finish_game(&mut self) {
        self.round.finish();
        self.out.push(Event::GameOver {
            round: self.round.current_round(),
            total_stuns: self.round.total_stuns(),
        });
        info!(
            round = self.round.current_round(),
            total_stuns = self.round.total_stuns(),
            "game_over"
        );
    }

    fn pick_spawn_point(&mut self) -> Option<SpawnPoint> {
        if self.spawn_points.is_empty() {
            return None;
        }
        let index = self.streams.placement.gen_range(0..self.spawn_points.len());
        self.spawn_points.get(index).copied()
    }
}

fn sample_between(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}
