use bat_rounds_system_sampling::{choose, stream_rng};
use rand::Rng;

#[test]
fn lone_nonzero_weight_wins_every_trial() {
    let mut rng = stream_rng(0x5eed, "lone");
    for position in 0..5 {
        let mut weights = [0.0_f32; 5];
        weights[position] = 0.37;
        for _ in 0..500 {
            assert_eq!(
                choose(&weights, &mut rng),
                Ok(position),
                "weights {weights:?} picked the wrong index"
            );
        }
    }
}

#[test]
fn chosen_index_stays_in_bounds() {
    let mut rng = stream_rng(0xface, "bounds");
    for _ in 0..2_000 {
        let len = rng.gen_range(1..8);
        let weights: Vec<f32> = (0..len)
            .map(|_| {
                if rng.gen_bool(0.3) {
                    0.0
                } else {
                    rng.gen_range(0.0..10.0)
                }
            })
            .collect();
        let index = choose(&weights, &mut rng).expect("valid weights");
        assert!(index < weights.len());
    }
}

#[test]
fn equal_weights_are_uniform() {
    let mut rng = stream_rng(0xbeef, "uniform");
    let weights = [1.0_f32; 4];
    let trials = 40_000;
    let mut counts = [0_u32; 4];
    for _ in 0..trials {
        counts[choose(&weights, &mut rng).expect("valid weights")] += 1;
    }

    let expected = trials as f64 / 4.0;
    for (index, count) in counts.iter().enumerate() {
        let deviation = (f64::from(*count) - expected).abs();
        assert!(
            deviation < expected * 0.05,
            "index {index} drawn {count} times, expected about {expected}"
        );
    }
}

#[test]
fn zero_weights_are_never_chosen_before_the_fallback() {
    let mut rng = stream_rng(0xcafe, "skip");
    let weights = [0.0_f32, 2.0, 0.0, 1.0];
    for _ in 0..2_000 {
        let index = choose(&weights, &mut rng).expect("valid weights");
        assert!(index == 1 || index == 3, "picked zero weight index {index}");
    }
}
