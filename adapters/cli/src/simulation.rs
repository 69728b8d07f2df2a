use anyhow::{bail, Result};
use bat_rounds_core::{ActivationState, Event, Outcome};
use bat_rounds_system_scheduler::Scheduler;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Knobs controlling the simulated player.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlayerOptions {
    /// Probability that a chosen actor is stunned rather than left to flee.
    pub(crate) hit_chance: f64,
    /// Upper bound on resolutions before the run is cut short.
    pub(crate) max_resolutions: u32,
    /// Resolutions a dropped debuff stays active for.
    pub(crate) debuff_duration: u32,
}

/// Totals gathered over a simulated game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Summary {
    pub(crate) resolutions: u32,
    pub(crate) stuns: u32,
    pub(crate) flees: u32,
    pub(crate) modifier_drops: u32,
    pub(crate) rounds_reached: u32,
    pub(crate) game_over: bool,
}

/// Plays the scheduler with a seeded player until the game ends or the budget runs out.
///
/// Every event is handed to `sink` in emission order.
pub(crate) fn play(
    scheduler: &mut Scheduler,
    options: PlayerOptions,
    rng: &mut ChaCha8Rng,
    mut sink: impl FnMut(&Event) -> Result<()>,
) -> Result<Summary> {
    if !(0.0..=1.0).contains(&options.hit_chance) {
        bail!("hit chance {} must lie within [0, 1]", options.hit_chance);
    }

    let mut summary = Summary::default();
    let mut debuff_remaining = 0_u32;
    let mut events = Vec::new();

    scheduler.start(&mut events);
    drain(&mut events, &mut sink)?;

    while !scheduler.is_game_over() && summary.resolutions < options.max_resolutions {
        let candidates: Vec<_> = scheduler
            .actors()
            .on_screen()
            .filter(|snapshot| snapshot.state == ActivationState::Active)
            .map(|snapshot| snapshot.id)
            .collect();
        if candidates.is_empty() {
            warn!(
                round = scheduler.round().current_round(),
                "no_actor_on_screen"
            );
            break;
        }
        let actor = candidates[rng.gen_range(0..candidates.len())];

        let outcome = if rng.gen_bool(options.hit_chance) {
            summary.stuns += 1;
            Outcome::Stunned
        } else {
            scheduler.notify_actor_fleeing(actor, &mut events);
            summary.flees += 1;
            Outcome::Fled
        };
        scheduler.notify_actor_resolved(actor, outcome, &mut events);
        summary.resolutions += 1;

        if debuff_remaining > 0 {
            debuff_remaining -= 1;
            if debuff_remaining == 0 {
                scheduler.set_debuff_active(false);
            }
        }
        for event in &events {
            if let Event::ModifierDropped { modifier, .. } = event {
                summary.modifier_drops += 1;
                if modifier.is_debuff() && options.debuff_duration > 0 {
                    debuff_remaining = options.debuff_duration;
                    scheduler.set_debuff_active(true);
                    debug!(modifier = ?modifier, "debuff_started");
                }
            }
        }
        drain(&mut events, &mut sink)?;
    }

    summary.rounds_reached = scheduler.round().current_round();
    summary.game_over = scheduler.is_game_over();
    info!(
        resolutions = summary.resolutions,
        rounds = summary.rounds_reached,
        game_over = summary.game_over,
        "simulation_finished"
    );
    Ok(summary)
}

fn drain(events: &mut Vec<Event>, sink: &mut impl FnMut(&Event) -> Result<()>) -> Result<()> {
    for event in events.drain(..) {
        sink(&event)?;
    }
    Ok(())
}

/// Human-readable one-line description of an event.
pub(crate) fn describe(event: &Event) -> String {
    match event {
        Event::ActorActivated {
            actor,
            kind,
            position,
            speed,
            scale,
        } => format!(
            "spawn    actor {:>2} {kind:?} at ({:.1}, {:.1}) speed {speed:.2} scale {scale:.2}",
            actor.get(),
            position.x(),
            position.y()
        ),
        Event::ActorFleeing { actor } => format!("flee     actor {:>2}", actor.get()),
        Event::ActorResolved {
            actor,
            kind,
            outcome,
        } => format!("resolve  actor {:>2} {kind:?} {outcome:?}", actor.get()),
        Event::ActorDeactivated { actor } => format!("return   actor {:>2}", actor.get()),
        Event::ActorPaceChanged {
            actor,
            speed,
            scale,
        } => format!(
            "pace     actor {:>2} speed {speed:.2} scale {scale:.2}",
            actor.get()
        ),
        Event::TransitionRejected { actor, reason } => {
            format!("reject   actor {:>2} {reason:?}", actor.get())
        }
        Event::RoundAdvanced { round } => format!("round    {round}"),
        Event::GameOver { round, total_stuns } => {
            format!("gameover round {round} after {total_stuns} resolutions")
        }
        Event::ModifierDropped {
            actor,
            modifier,
            position,
        } => format!(
            "drop     actor {:>2} {modifier:?} at ({:.1}, {:.1})",
            actor.get(),
            position.x(),
            position.y()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bat_rounds_core::{GameConfig, GameMode};
    use rand::SeedableRng;

    fn options(hit_chance: f64) -> PlayerOptions {
        PlayerOptions {
            hit_chance,
            max_resolutions: 10_000,
            debuff_duration: 4,
        }
    }

    fn run(mode: GameMode, hit_chance: f64, seed: u64) -> (Summary, Vec<Event>) {
        let mut config = GameConfig::for_mode(mode);
        config.seed = seed;
        let mut scheduler = Scheduler::new(&config).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut events = Vec::new();
        let summary = play(&mut scheduler, options(hit_chance), &mut rng, |event| {
            events.push(event.clone());
            Ok(())
        })
        .expect("simulation runs");
        (summary, events)
    }

    #[test]
    fn perfect_player_finishes_every_classic_round() {
        let (summary, events) = run(GameMode::Classic, 1.0, 5);
        assert!(summary.game_over);
        assert_eq!(summary.rounds_reached, 10);
        assert_eq!(summary.flees, 0);
        assert!(matches!(events.last(), Some(Event::GameOver { round: 10, .. })));
    }

    #[test]
    fn escaping_actors_still_advance_the_game() {
        let (summary, _) = run(GameMode::Cooperative, 0.0, 9);
        assert!(summary.game_over);
        assert_eq!(summary.stuns, 0);
        assert_eq!(summary.rounds_reached, 15);
    }

    #[test]
    fn same_seed_same_story() {
        assert_eq!(
            run(GameMode::Cooperative, 0.7, 21),
            run(GameMode::Cooperative, 0.7, 21)
        );
    }

    #[test]
    fn resolution_budget_cuts_the_run_short() {
        let mut scheduler =
            Scheduler::new(&GameConfig::for_mode(GameMode::Classic)).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let summary = play(
            &mut scheduler,
            PlayerOptions {
                max_resolutions: 3,
                ..options(1.0)
            },
            &mut rng,
            |_| Ok(()),
        )
        .expect("simulation runs");
        assert_eq!(summary.resolutions, 3);
        assert!(!summary.game_over);
    }

    #[test]
    fn out_of_range_hit_chance_is_rejected() {
        let mut scheduler =
            Scheduler::new(&GameConfig::for_mode(GameMode::Classic)).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(play(&mut scheduler, options(1.5), &mut rng, |_| Ok(())).is_err());
    }

    #[test]
    fn every_event_has_a_description() {
        let (_, events) = run(GameMode::Classic, 0.9, 3);
        assert!(events.iter().all(|event| !describe(event).is_empty()));
    }
}
