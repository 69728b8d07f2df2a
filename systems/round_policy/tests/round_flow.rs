use bat_rounds_core::{
    ActorId, ActorKind, Command, Event, ModeConfig, Outcome, SpawnPoint, SurpriseModifier,
};
use bat_rounds_system_round_policy::{
    ClassicPolicy, CooperativePolicy, RoundContext, RoundPolicy, RoundState, RoundStreams,
};
use bat_rounds_system_unlocks::UnlockCounters;
use bat_rounds_world::{apply, query, ActorPool};

struct Harness {
    pool: ActorPool,
    unlocks: UnlockCounters,
    round: RoundState,
    streams: RoundStreams,
    spawn_points: Vec<SpawnPoint>,
    events: Vec<Event>,
}

impl Harness {
    fn new(rules: &ModeConfig, kinds: Vec<ActorKind>) -> Self {
        let pool = ActorPool::new(kinds);
        let round = RoundState::new(rules, query::capacity(&pool));
        Self {
            pool,
            unlocks: UnlockCounters::new(),
            round,
            streams: RoundStreams::from_seed(11),
            spawn_points: vec![SpawnPoint::new(-3.0, 1.0), SpawnPoint::new(3.0, 1.0)],
            events: Vec::new(),
        }
    }

    fn with_ctx<T>(&mut self, body: impl FnOnce(&mut RoundContext<'_>) -> T) -> T {
        let mut ctx = RoundContext::new(
            &mut self.pool,
            &mut self.unlocks,
            &mut self.round,
            &mut self.streams,
            &self.spawn_points,
            &mut self.events,
        );
        body(&mut ctx)
    }

    fn first_on_screen(&self) -> ActorId {
        query::actor_view(&self.pool)
            .on_screen()
            .next()
            .map(|snapshot| snapshot.id)
            .expect("an actor on screen")
    }

    fn resolve(&mut self, policy: &mut dyn RoundPolicy, actor: ActorId) {
        apply(
            &mut self.pool,
            Command::ResolveActor {
                actor,
                outcome: Outcome::Stunned,
            },
            &mut self.events,
        );
        apply(&mut self.pool, Command::DeactivateActor { actor }, &mut self.events);
        self.round.record_resolution();
        self.with_ctx(|ctx| policy.on_actor_resolved(ctx));
    }

    fn active(&self) -> usize {
        query::active_count(&self.pool)
    }
}

fn regulars(count: usize) -> Vec<ActorKind> {
    vec![ActorKind::Regular; count]
}

fn quiet_rules() -> ModeConfig {
    let mut rules = ModeConfig::classic();
    rules.unlock_rates.clear();
    rules.round_start_modifier = false;
    rules
}

#[test]
fn first_round_spawns_up_to_the_target() {
    let mut rules = quiet_rules();
    rules.initial_target_count = 5;
    rules.initial_max_on_screen = 8;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut harness = Harness::new(&rules, regulars(10));

    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    assert_eq!(harness.active(), 5);
    assert_eq!(harness.round.current_round(), 1);
}

#[test]
fn first_round_stops_at_the_on_screen_cap() {
    let mut rules = quiet_rules();
    rules.initial_target_count = 5;
    rules.initial_max_on_screen = 3;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut harness = Harness::new(&rules, regulars(10));

    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    assert_eq!(harness.active(), 3);
}

#[test]
fn spawning_more_never_exceeds_the_cap() {
    let mut rules = quiet_rules();
    rules.initial_target_count = 9;
    rules.initial_max_on_screen = 3;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut harness = Harness::new(&rules, regulars(10));
    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    for _ in 0..4 {
        harness.with_ctx(|ctx| policy.try_spawn_more(ctx));
        assert_eq!(harness.active(), 3);
    }

    for _ in 0..8 {
        let actor = harness.first_on_screen();
        harness.resolve(&mut policy, actor);
        let needed = harness.round.needed() as usize;
        assert!(harness.active() <= 3);
        assert!(harness.active() <= needed.max(1));
    }
}

#[test]
fn completing_a_round_escalates_and_announces_it() {
    let mut rules = quiet_rules();
    rules.initial_target_count = 2;
    rules.initial_max_on_screen = 2;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut harness = Harness::new(&rules, regulars(12));
    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    for _ in 0..2 {
        let actor = harness.first_on_screen();
        harness.resolve(&mut policy, actor);
    }

    assert_eq!(harness.round.current_round(), 2);
    assert_eq!(harness.round.stuns_this_round(), 0);
    assert_eq!(harness.round.target_count_needed(), 4);
    assert_eq!(harness.round.max_concurrent_on_screen(), 3);
    assert_eq!(harness.active(), 3);
    assert!(harness.events.contains(&Event::RoundAdvanced { round: 2 }));
}

#[test]
fn round_start_modifier_raises_the_target_only_when_spawned() {
    let mut rules = quiet_rules();
    rules.round_start_modifier = true;
    rules.initial_target_count = 1;
    rules.initial_max_on_screen = 4;
    rules.escalation.target_increment = 0;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut kinds = regulars(6);
    kinds.push(ActorKind::Modifier);
    let mut harness = Harness::new(&rules, kinds);
    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    let actor = harness.first_on_screen();
    harness.resolve(&mut policy, actor);

    assert_eq!(harness.round.target_count_needed(), 2);
    assert_eq!(
        query::state(&harness.pool, ActorId::new(6)),
        Some(bat_rounds_core::ActivationState::Active)
    );

    let mut no_modifier = Harness::new(&rules, regulars(6));
    no_modifier.with_ctx(|ctx| policy.start_round(ctx, true));
    let actor = no_modifier.first_on_screen();
    no_modifier.resolve(&mut policy, actor);
    assert_eq!(no_modifier.round.target_count_needed(), 1);
}

#[test]
fn final_round_ends_the_game_without_spawning() {
    let mut rules = quiet_rules();
    rules.num_rounds = 1;
    rules.initial_target_count = 1;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut harness = Harness::new(&rules, regulars(5));
    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    let actor = harness.first_on_screen();
    harness.events.clear();
    harness.resolve(&mut policy, actor);

    assert!(harness.round.is_game_over());
    assert_eq!(harness.active(), 0);
    assert_eq!(
        harness.events.last(),
        Some(&Event::GameOver {
            round: 1,
            total_stuns: 1,
        })
    );
    assert!(!harness
        .events
        .iter()
        .any(|event| matches!(event, Event::ActorActivated { .. })));
}

#[test]
fn pace_escalates_with_each_round() {
    let mut rules = quiet_rules();
    rules.initial_target_count = 1;
    let mut policy = ClassicPolicy::new(rules.clone());
    let mut harness = Harness::new(&rules, regulars(5));
    harness.with_ctx(|ctx| policy.start_round(ctx, true));
    let actor = harness.first_on_screen();
    harness.resolve(&mut policy, actor);

    let (min_speed, max_speed) = harness.round.speed_range();
    assert_eq!((min_speed, max_speed), (3.5, 4.0));
    for index in 0..5 {
        let (speed, scale) = query::pace(&harness.pool, ActorId::new(index)).expect("pace");
        assert!((min_speed..=max_speed).contains(&speed));
        assert!((rules.pace.min_scale..=rules.pace.max_scale).contains(&scale));
    }
}

#[test]
fn certain_surprise_forces_a_modifier_and_raises_the_target() {
    let mut rules = ModeConfig::cooperative();
    rules.unlock_rates.clear();
    rules.initial_target_count = 4;
    rules.initial_max_on_screen = 4;
    let mut policy = CooperativePolicy::new(
        rules.clone(),
        SurpriseModifier {
            interval: 1,
            chance: 1.0,
        },
    );
    let mut kinds = regulars(8);
    kinds.push(ActorKind::Modifier);
    let mut harness = Harness::new(&rules, kinds);
    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    let actor = harness.first_on_screen();
    harness.resolve(&mut policy, actor);

    assert_eq!(harness.round.target_count_needed(), 5);
    assert_eq!(
        query::state(&harness.pool, ActorId::new(8)),
        Some(bat_rounds_core::ActivationState::Active)
    );
}

#[test]
fn impossible_surprise_leaves_the_target_alone() {
    let mut rules = ModeConfig::cooperative();
    rules.initial_target_count = 4;
    let mut policy = CooperativePolicy::new(
        rules.clone(),
        SurpriseModifier {
            interval: 1,
            chance: 0.0,
        },
    );
    let mut kinds = regulars(8);
    kinds.push(ActorKind::Modifier);
    let mut harness = Harness::new(&rules, kinds);
    harness.with_ctx(|ctx| policy.start_round(ctx, true));

    let actor = harness.first_on_screen();
    harness.resolve(&mut policy, actor);

    assert_eq!(harness.round.target_count_needed(), 4);
}
