#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round and spawn scheduler for Bat Rounds.
//!
//! The [`Scheduler`] owns the actor pool and all round bookkeeping. Adapters
//! report lifecycle notifications for on-screen actors and receive every
//! resulting [`Event`] in the buffer they pass in. All randomness flows from
//! seeded streams so identical notification sequences replay identically.

use bat_rounds_core::{
    ActivationState, ActorId, ActorKind, ActorView, Command, ConfigError, Event, GameConfig,
    Outcome, SceneConfig, SpawnPoint, RNG_STREAM_DROPS,
};
use bat_rounds_system_modifier_drops::ModifierDropSelector;
use bat_rounds_system_round_policy::{
    policy_for, RoundContext, RoundPolicy, RoundState, RoundStreams,
};
use bat_rounds_system_sampling::stream_rng;
use bat_rounds_system_unlocks::UnlockCounters;
use bat_rounds_world::{self as world, query, ActorPool};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

/// Drives rounds and spawns in response to actor lifecycle notifications.
#[derive(Debug)]
pub struct Scheduler {
    pool: ActorPool,
    unlocks: UnlockCounters,
    round: RoundState,
    policy: Box<dyn RoundPolicy>,
    streams: RoundStreams,
    drop_rng: ChaCha8Rng,
    drops: ModifierDropSelector,
    spawn_points: Vec<SpawnPoint>,
    debuff_active: bool,
    started: bool,
}

impl Scheduler {
    /// Builds a scheduler for the configured mode after validating the configuration.
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::with_policy(&config.scene, policy_for(config), config.seed)
    }

    /// Builds a scheduler around a caller-provided round policy.
    pub fn with_policy(
        scene: &SceneConfig,
        policy: Box<dyn RoundPolicy>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        scene.validate()?;
        policy.rules().validate()?;
        scene.validate_against(policy.rules())?;

        let pool = ActorPool::new(scene.actor_kinds());
        let round = RoundState::new(policy.rules(), query::capacity(&pool));
        info!(
            capacity = query::capacity(&pool),
            spawn_points = scene.spawn_points.len(),
            rounds = policy.rules().num_rounds,
            seed,
            "scheduler_created"
        );

        Ok(Self {
            pool,
            unlocks: UnlockCounters::new(),
            round,
            policy,
            streams: RoundStreams::from_seed(seed),
            drop_rng: stream_rng(seed, RNG_STREAM_DROPS),
            drops: ModifierDropSelector::new(),
            spawn_points: scene.spawn_points.clone(),
            debuff_active: false,
            started: false,
        })
    }

    /// Rolls the opening pace and spawns the first round. Later calls are ignored.
    pub fn start(&mut self, out: &mut Vec<Event>) {
        if self.started {
            warn!("scheduler_already_started");
            return;
        }
        self.started = true;

        let pace = self.policy.rules().pace;
        let mut ctx = RoundContext::new(
            &mut self.pool,
            &mut self.unlocks,
            &mut self.round,
            &mut self.streams,
            &self.spawn_points,
            out,
        );
        ctx.reroll_pace(&pace);
        self.policy.start_round(&mut ctx, true);
        info!(
            round = self.round.current_round(),
            target = self.round.target_count_needed(),
            active = query::active_count(&self.pool),
            "first_round_started"
        );
    }

    /// Reports that an active actor started escaping.
    pub fn notify_actor_fleeing(&mut self, actor: ActorId, out: &mut Vec<Event>) {
        if self.round.is_game_over() {
            debug!(actor = actor.get(), "flee_after_game_over_ignored");
            return;
        }
        if query::state(&self.pool, actor) != Some(ActivationState::Active) {
            warn!(actor = actor.get(), "stale_flee_notification_ignored");
            return;
        }
        world::apply(&mut self.pool, Command::BeginFlee { actor }, out);
    }

    /// Reports that an on-screen actor was stunned or escaped.
    ///
    /// The actor returns to the pool, the resolution counts toward the round,
    /// and the round policy decides what spawns next.
    pub fn notify_actor_resolved(
        &mut self,
        actor: ActorId,
        outcome: Outcome,
        out: &mut Vec<Event>,
    ) {
        if self.round.is_game_over() {
            debug!(actor = actor.get(), "resolution_after_game_over_ignored");
            return;
        }
        if !self.started {
            warn!(actor = actor.get(), "resolution_before_start_ignored");
            return;
        }
        let (Some(kind), Some(state)) = (
            query::kind(&self.pool, actor),
            query::state(&self.pool, actor),
        ) else {
            warn!(actor = actor.get(), "unknown_actor_resolution_ignored");
            return;
        };
        if !matches!(state, ActivationState::Active | ActivationState::Fleeing) {
            warn!(actor = actor.get(), state = ?state, "stale_resolution_ignored");
            return;
        }

        world::apply(&mut self.pool, Command::ResolveActor { actor, outcome }, out);
        if kind == ActorKind::Modifier && outcome == Outcome::Stunned {
            self.drop_modifier(actor, out);
        }
        world::apply(&mut self.pool, Command::DeactivateActor { actor }, out);
        self.round.record_resolution();
        debug!(
            actor = actor.get(),
            kind = ?kind,
            outcome = ?outcome,
            stuns = self.round.stuns_this_round(),
            target = self.round.target_count_needed(),
            "actor_resolved"
        );

        let mut ctx = RoundContext::new(
            &mut self.pool,
            &mut self.unlocks,
            &mut self.round,
            &mut self.streams,
            &self.spawn_points,
            out,
        );
        self.policy.on_actor_resolved(&mut ctx);
        self.check_round_invariant();
    }

    /// Records whether a debuff is currently running, which withholds debuff drops.
    pub fn set_debuff_active(&mut self, active: bool) {
        if self.debuff_active != active {
            debug!(active, "debuff_state_changed");
        }
        self.debuff_active = active;
    }

    /// Reports whether a debuff is currently running.
    #[must_use]
    pub fn debuff_active(&self) -> bool {
        self.debuff_active
    }

    /// Current round bookkeeping.
    #[must_use]
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Reports whether the final round was completed.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.round.is_game_over()
    }

    /// Read-only access to the actor pool.
    #[must_use]
    pub fn pool(&self) -> &ActorPool {
        &self.pool
    }

    /// Spawn credits that have not been consumed yet.
    #[must_use]
    pub fn unlocks(&self) -> &UnlockCounters {
        &self.unlocks
    }

    /// Snapshot of every pooled actor.
    #[must_use]
    pub fn actors(&self) -> ActorView {
        query::actor_view(&self.pool)
    }

    /// Number of actors currently holding an on-screen slot.
    #[must_use]
    pub fn active_count(&self) -> usize {
        query::active_count(&self.pool)
    }

    fn drop_modifier(&mut self, actor: ActorId, out: &mut Vec<Event>) {
        let Some(position) = query::position(&self.pool, actor) else {
            warn!(actor = actor.get(), "modifier_drop_without_position");
            return;
        };
        match self.drops.select(
            &self.policy.rules().modifier_weights,
            self.debuff_active,
            &mut self.drop_rng,
        ) {
            Ok(modifier) => {
                out.push(Event::ModifierDropped {
                    actor,
                    modifier,
                    position,
                });
                debug!(actor = actor.get(), modifier = ?modifier, "modifier_dropped");
            }
            Err(error) => {
                error!(actor = actor.get(), %error, "modifier_drop_failed");
            }
        }
    }

    fn check_round_invariant(&self) {
        let holds = self.round.stuns_this_round() <= self.round.target_count_needed();
        if !holds {
            error!(
                round = self.round.current_round(),
                stuns = self.round.stuns_this_round(),
                target = self.round.target_count_needed(),
                "round_invariant_violated"
            );
        }
        debug_assert!(holds, "resolutions exceeded the round target");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bat_rounds_core::{GameMode, ModeConfig, ModifierKind, ModifierWeight, PoolEntry};

    fn config(rules: ModeConfig, pool: Vec<PoolEntry>) -> GameConfig {
        let mut config = GameConfig::for_mode(GameMode::Classic);
        config.rules = rules;
        config.scene.pool = pool;
        config
    }

    fn on_screen(scheduler: &Scheduler) -> Vec<ActorId> {
        scheduler
            .actors()
            .on_screen()
            .map(|snapshot| snapshot.id)
            .collect()
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut config = GameConfig::for_mode(GameMode::Classic);
        config.rules.num_rounds = 0;
        assert_eq!(
            Scheduler::new(&config).map(|_| ()),
            Err(ConfigError::ZeroRounds)
        );
    }

    #[test]
    fn stunned_modifier_drops_a_buff_while_a_debuff_runs() {
        let mut rules = ModeConfig::classic();
        rules.unlock_rates.clear();
        rules.debug = true;
        rules.initial_target_count = 1;
        rules.modifier_weights = vec![
            ModifierWeight {
                kind: ModifierKind::Snail,
                weight: 5.0,
            },
            ModifierWeight {
                kind: ModifierKind::Emp,
                weight: 0.1,
            },
        ];
        let mut scheduler = Scheduler::new(&config(
            rules,
            vec![
                PoolEntry {
                    kind: ActorKind::Modifier,
                    count: 1,
                },
                PoolEntry {
                    kind: ActorKind::Regular,
                    count: 4,
                },
            ],
        ))
        .expect("valid config");
        scheduler.set_debuff_active(true);
        let mut events = Vec::new();
        scheduler.start(&mut events);
        assert_eq!(on_screen(&scheduler), vec![ActorId::new(0)]);

        events.clear();
        scheduler.notify_actor_resolved(ActorId::new(0), Outcome::Stunned, &mut events);

        assert!(events.iter().any(|event| matches!(
            event,
            Event::ModifierDropped {
                actor,
                modifier: ModifierKind::Emp,
                ..
            } if *actor == ActorId::new(0)
        )));
    }

    #[test]
    fn fled_modifier_drops_nothing() {
        let mut rules = ModeConfig::classic();
        rules.unlock_rates.clear();
        rules.debug = true;
        rules.initial_target_count = 1;
        let mut scheduler = Scheduler::new(&config(
            rules,
            vec![
                PoolEntry {
                    kind: ActorKind::Modifier,
                    count: 1,
                },
                PoolEntry {
                    kind: ActorKind::Regular,
                    count: 4,
                },
            ],
        ))
        .expect("valid config");
        let mut events = Vec::new();
        scheduler.start(&mut events);
        events.clear();
        scheduler.notify_actor_resolved(ActorId::new(0), Outcome::Fled, &mut events);

        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ModifierDropped { .. })));
        assert_eq!(scheduler.round().total_stuns(), 1);
    }

    #[test]
    fn starting_twice_spawns_once() {
        let mut scheduler =
            Scheduler::new(&GameConfig::for_mode(GameMode::Classic)).expect("valid config");
        let mut events = Vec::new();
        scheduler.start(&mut events);
        let active = scheduler.active_count();
        scheduler.start(&mut events);
        assert_eq!(scheduler.active_count(), active);
    }
}
