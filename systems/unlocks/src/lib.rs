#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rate-gated spawn credits for special actor kinds.

use std::collections::BTreeMap;

use bat_rounds_core::{ActorKind, SpawnRate};
use tracing::debug;

/// Spawn credits currently available for each special actor kind.
///
/// A kind earns one credit whenever the total stun count is a multiple of its
/// configured rate. Credits accumulate until a spawn of that kind consumes one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnlockCounters {
    credits: BTreeMap<ActorKind, u32>,
}

impl UnlockCounters {
    /// Creates counters with no credits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants one credit to every special kind whose rate divides `total_stun_count`.
    ///
    /// Entries for the default kind and entries with a zero rate never grant credits.
    pub fn on_stun_recorded(&mut self, total_stun_count: u32, rate_table: &[SpawnRate]) {
        for entry in rate_table {
            if entry.kind.is_default() || entry.rate == 0 {
                continue;
            }
            if total_stun_count % entry.rate != 0 {
                continue;
            }

            let credits = self.credits.entry(entry.kind).or_insert(0);
            *credits = credits.saturating_add(1);
            debug!(
                kind = ?entry.kind,
                total_stun_count,
                credits = *credits,
                "spawn_credit_unlocked"
            );
        }
    }

    /// Consumes one credit for `kind`, reporting whether one was available.
    pub fn try_consume(&mut self, kind: ActorKind) -> bool {
        match self.credits.get_mut(&kind) {
            Some(credits) if *credits > 0 => {
                *credits -= 1;
                true
            }
            _ => false,
        }
    }

    /// Number of unconsumed credits for `kind`.
    #[must_use]
    pub fn available(&self, kind: ActorKind) -> u32 {
        self.credits.get(&kind).copied().unwrap_or(0)
    }

    /// Reports whether `kind` holds at least one credit.
    #[must_use]
    pub fn has_credit(&self, kind: ActorKind) -> bool {
        self.available(kind) > 0
    }
}
