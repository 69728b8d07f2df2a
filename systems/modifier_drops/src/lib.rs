#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted selection of the buff or debuff a modifier actor drops.

use bat_rounds_core::{ConfigError, ModifierKind, ModifierWeight};
use bat_rounds_system_sampling::choose;
use rand::Rng;

/// Chooses modifier drops, reusing scratch buffers between selections.
#[derive(Debug, Default)]
pub struct ModifierDropSelector {
    kinds: Vec<ModifierKind>,
    weights: Vec<f32>,
}

impl ModifierDropSelector {
    /// Creates a selector with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks one modifier from the mode's enabled table.
    ///
    /// Debuffs are left out while `debuff_active` is set so negative effects
    /// never stack. Fails when no candidate remains.
    pub fn select<R>(
        &mut self,
        table: &[ModifierWeight],
        debuff_active: bool,
        rng: &mut R,
    ) -> Result<ModifierKind, ConfigError>
    where
        R: Rng + ?Sized,
    {
        self.kinds.clear();
        self.weights.clear();
        for entry in table {
            if debuff_active && entry.kind.is_debuff() {
                continue;
            }
            self.kinds.push(entry.kind);
            self.weights.push(entry.weight);
        }

        if self.kinds.is_empty() {
            return Err(ConfigError::EmptyWeightTable);
        }

        let index = choose(&self.weights, rng)?;
        Ok(self.kinds[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_table_is_a_config_error() {
        let mut selector = ModifierDropSelector::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert_eq!(
            selector.select(&[], false, &mut rng),
            Err(ConfigError::EmptyWeightTable)
        );
    }

    #[test]
    fn debuff_only_table_fails_while_a_debuff_runs() {
        let mut selector = ModifierDropSelector::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let table = [ModifierWeight {
            kind: ModifierKind::Snail,
            weight: 1.0,
        }];
        assert_eq!(selector.select(&table, false, &mut rng), Ok(ModifierKind::Snail));
        assert_eq!(
            selector.select(&table, true, &mut rng),
            Err(ConfigError::EmptyWeightTable)
        );
    }
}
