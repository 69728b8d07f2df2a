#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted random choice and deterministic random stream derivation.

use bat_rounds_core::ConfigError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Picks an index with probability proportional to its weight.
///
/// Indices are tested left to right. Each test draws uniformly from the mass
/// that has not been tested yet and accepts the index when the draw lands
/// inside its weight. The last index is returned when no earlier index is
/// accepted, which also covers a list whose weights sum to zero.
pub fn choose<R>(weights: &[f32], rng: &mut R) -> Result<usize, ConfigError>
where
    R: Rng + ?Sized,
{
    let Some(last_index) = weights.len().checked_sub(1) else {
        return Err(ConfigError::EmptyWeightTable);
    };

    let mut remaining = 0.0_f64;
    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidWeight { index, weight });
        }
        remaining += f64::from(weight);
    }

    for (index, &weight) in weights[..last_index].iter().enumerate() {
        if remaining <= 0.0 {
            break;
        }

        let weight = f64::from(weight);
        let draw = rng.gen::<f64>() * remaining;
        // A weight holding all untested mass must win even if the draw rounds up to it.
        if draw < weight || weight >= remaining {
            return Ok(index);
        }
        remaining -= weight;
    }

    Ok(last_index)
}

/// Derives the seed of a named random stream from the global seed.
#[must_use]
pub fn derive_stream_seed(global_seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

/// Creates the named random stream for the global seed.
#[must_use]
pub fn stream_rng(global_seed: u64, label: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_stream_seed(global_seed, label))
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
