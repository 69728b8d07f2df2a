#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round progression policies for Bat Rounds.
//!
//! A [`RoundPolicy`] decides which pooled actor spawns next, how many actors a
//! round starts with, when a round completes, and how the difficulty escalates
//! between rounds. The shared contract lives in the trait's provided methods;
//! [`ClassicPolicy`] and [`CooperativePolicy`] differ only in their rules and in
//! the hook that runs before the round-completion check.

mod context;
mod state;

use std::fmt;

use bat_rounds_core::{
    ActivationState, ActorId, ActorKind, GameConfig, GameMode, ModeConfig, SpawnRate,
    SurpriseModifier,
};
use bat_rounds_system_unlocks::UnlockCounters;
use bat_rounds_world::{query, ActorPool};
use tracing::{debug, info, warn};

pub use context::{RoundContext, RoundStreams};
pub use state::RoundState;

/// Mode-specific round behaviour layered over a shared selection and escalation contract.
pub trait RoundPolicy: fmt::Debug {
    /// Rules the policy was built from.
    fn rules(&self) -> &ModeConfig;

    /// Runs after spawn credits are updated and before the round-completion check.
    fn before_completion_check(&mut self, _ctx: &mut RoundContext<'_>) {}

    /// Picks the next pooled actor to spawn, consuming a spawn credit when one is used.
    fn select_next_actor(
        &self,
        pool: &ActorPool,
        unlocks: &mut UnlockCounters,
    ) -> Option<ActorId> {
        select_next_actor(self.rules(), pool, unlocks)
    }

    /// Spawns the opening batch of a round, escalating first unless it is the first round.
    fn start_round(&mut self, ctx: &mut RoundContext<'_>, is_first_round: bool) {
        if !is_first_round {
            self.advance_round_parameters(ctx);
        }

        for _ in 0..ctx.round.target_count_needed() {
            if ctx.at_cap() {
                break;
            }
            if !self.spawn_next(ctx) {
                debug!(
                    round = ctx.round.current_round(),
                    "round_start_found_no_inactive_actor"
                );
                break;
            }
        }
    }

    /// Moves to the next round and applies the escalation deltas.
    fn advance_round_parameters(&mut self, ctx: &mut RoundContext<'_>) {
        let rules = self.rules();
        let capacity = ctx.capacity();
        ctx.round.advance(&rules.escalation, &rules.pace, capacity);
        ctx.reroll_pace(&rules.pace);
        ctx.announce_round();
    }

    /// Reacts to a resolution that was already counted in the round state.
    fn on_actor_resolved(&mut self, ctx: &mut RoundContext<'_>) {
        if ctx.round.is_game_over() {
            return;
        }

        let total_stuns = ctx.round.total_stuns();
        ctx.unlocks
            .on_stun_recorded(total_stuns, &self.rules().unlock_rates);
        self.before_completion_check(ctx);

        if !ctx.round.is_complete() {
            self.try_spawn_more(ctx);
            return;
        }

        let num_rounds = self.rules().num_rounds;
        if ctx.round.is_final_round(num_rounds) {
            ctx.finish_game();
            return;
        }

        self.start_round(ctx, false);
        if self.rules().round_start_modifier && ctx.spawn_kind(ActorKind::Modifier) {
            ctx.round.raise_target(1);
            debug!(
                round = ctx.round.current_round(),
                target = ctx.round.target_count_needed(),
                "round_start_modifier_spawned"
            );
        }
    }

    /// Spawns at most one actor when the round still needs more than are on screen.
    fn try_spawn_more(&mut self, ctx: &mut RoundContext<'_>) {
        let needed = ctx.round.needed() as usize;
        if needed == 0 || ctx.at_cap() || ctx.active_count() >= needed {
            return;
        }
        if !self.spawn_next(ctx) {
            debug!(
                round = ctx.round.current_round(),
                needed,
                "spawn_skipped_without_inactive_actor"
            );
        }
    }

    /// Spawns the selected actor, or a default actor when nothing is selectable.
    fn spawn_next(&mut self, ctx: &mut RoundContext<'_>) -> bool {
        match self.select_next_actor(ctx.pool, ctx.unlocks) {
            Some(actor) => ctx.spawn(actor),
            None => ctx.spawn_default(),
        }
    }
}

/// Walks the pool in order and returns the first actor the spawn credits allow.
///
/// While any special kind holds a credit, the first such kind in rate-table
/// order claims the next inactive actor of that kind and every other candidate
/// is passed over. Without credits only default-kind actors are selectable.
/// Debug rules bypass every filter and return the first inactive actor.
#[must_use]
pub fn select_next_actor(
    rules: &ModeConfig,
    pool: &ActorPool,
    unlocks: &mut UnlockCounters,
) -> Option<ActorId> {
    for (actor, kind, state) in query::roster(pool) {
        if state != ActivationState::Inactive {
            continue;
        }
        if rules.debug {
            return Some(actor);
        }
        if !rules.is_eligible(kind) {
            continue;
        }

        match claim(kind, &rules.unlock_rates, unlocks) {
            Claim::Matched(special) => {
                if unlocks.try_consume(special) {
                    debug!(actor = actor.get(), kind = ?special, "spawn_credit_consumed");
                    return Some(actor);
                }
            }
            Claim::SkipCandidate => {}
            Claim::NoMatch => {
                if kind.is_default() {
                    return Some(actor);
                }
            }
        }
    }
    None
}

enum Claim {
    Matched(ActorKind),
    SkipCandidate,
    NoMatch,
}

fn claim(kind: ActorKind, rates: &[SpawnRate], unlocks: &UnlockCounters) -> Claim {
    let Some(entry) = rates
        .iter()
        .find(|entry| !entry.kind.is_default() && unlocks.has_credit(entry.kind))
    else {
        return Claim::NoMatch;
    };

    if entry.kind == kind {
        Claim::Matched(kind)
    } else {
        Claim::SkipCandidate
    }
}

/// Round policy of the single-player mode.
#[derive(Clone, Debug)]
pub struct ClassicPolicy {
    rules: ModeConfig,
}

impl ClassicPolicy {
    /// Creates the policy from its rules.
    #[must_use]
    pub fn new(rules: ModeConfig) -> Self {
        Self { rules }
    }
}

impl RoundPolicy for ClassicPolicy {
    fn rules(&self) -> &ModeConfig {
        &self.rules
    }
}

/// Round policy of the cooperative mode.
///
/// Every `interval` resolutions a Bernoulli trial may force a modifier actor on
/// screen, raising the round target by one when it spawns.
#[derive(Clone, Debug)]
pub struct CooperativePolicy {
    rules: ModeConfig,
    surprise: SurpriseModifier,
}

impl CooperativePolicy {
    /// Creates the policy from its rules and surprise modifier settings.
    #[must_use]
    pub fn new(rules: ModeConfig, surprise: SurpriseModifier) -> Self {
        Self { rules, surprise }
    }
}

impl RoundPolicy for CooperativePolicy {
    fn rules(&self) -> &ModeConfig {
        &self.rules
    }

    fn before_completion_check(&mut self, ctx: &mut RoundContext<'_>) {
        let total_stuns = ctx.round.total_stuns();
        if total_stuns.checked_rem(self.surprise.interval) != Some(0) {
            return;
        }
        if !ctx.roll_surprise(self.surprise.chance) {
            return;
        }
        if ctx.spawn_kind(ActorKind::Modifier) {
            ctx.round.raise_target(1);
            info!(
                round = ctx.round.current_round(),
                target = ctx.round.target_count_needed(),
                "surprise_modifier_spawned"
            );
        }
    }
}

/// Builds the policy matching the configured game mode.
#[must_use]
pub fn policy_for(config: &GameConfig) -> Box<dyn RoundPolicy> {
    let rules = config.rules.clone();
    match config.mode {
        GameMode::Classic => {
            if rules.surprise_modifier.is_some() {
                warn!("surprise_modifier_ignored_in_classic_mode");
            }
            Box::new(ClassicPolicy::new(rules))
        }
        GameMode::Cooperative => {
            let surprise = rules.surprise_modifier.unwrap_or_default();
            Box::new(CooperativePolicy::new(rules, surprise))
        }
    }
}
