//! # Deception Layer
//!
//! Handles every request whose path is absent from the current
//! namespace mapping. Each miss scores the client, imposes a delay
//! that grows with repeat offenses, and returns the fixed decoy with a
//! success status so the probe looks like it worked.
//!
//! ## Threat Model
//!
//! Clients reaching this layer are replaying expired addresses or
//! enumerating the namespace. The response is tuned against automated
//! tooling:
//!
//! - **Success status**: scanners that key on status codes record a
//!   hit and stop probing alternatives.
//! - **Bait payload**: high-privilege fields make the response look
//!   worth exfiltrating.
//! - **Adaptive delay**: repeat offenders wait longer each time, which
//!   throttles brute-force enumeration without any explicit block.
//!
//! ## Security Notes
//!
//! - This path never forwards to a backend and never errors toward
//!   the client; the decoy is always served.
//! - Scoring is best-effort: a momentarily unavailable ledger skips
//!   the update rather than delaying or failing the response.

use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decoy::DecoyPayload;
use crate::reputation::ReputationLedger;

/// Tuning for the deception response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrapConfig {
    /// Fixed delay applied to every trap response, in milliseconds.
    pub base_delay_ms: u64,

    /// Delay budget added per point of prior suspicion, in milliseconds.
    pub delay_step_ms: u64,

    /// Upper bound on the score-scaled delay, in milliseconds.
    pub max_scaled_delay_ms: u64,
}

impl TrapConfig {
    /// Creates the default tuning (300ms base, 100ms per point,
    /// 900ms cap).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_delay_ms: 300,
            delay_step_ms: 100,
            max_scaled_delay_ms: 900,
        }
    }

    /// Sets the fixed per-response delay.
    #[must_use]
    pub const fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Sets the per-score delay step.
    #[must_use]
    pub const fn with_delay_step_ms(mut self, ms: u64) -> Self {
        self.delay_step_ms = ms;
        self
    }

    /// Sets the scaled-delay upper bound.
    #[must_use]
    pub const fn with_max_scaled_delay_ms(mut self, ms: u64) -> Self {
        self.max_scaled_delay_ms = ms;
        self
    }
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The deception layer: reputation ledger plus response policy.
///
/// # Example
///
/// ```rust,no_run
/// use chameleon_trap::{DeceptionLayer, TrapConfig};
///
/// # async fn demo() {
/// let trap = DeceptionLayer::new(TrapConfig::new().with_base_delay_ms(0));
/// let decoy = trap.handle_miss("10.0.0.9", "/admin/login_stale").await;
/// assert_eq!(decoy.status, "CRITICAL_SUCCESS");
/// assert_eq!(trap.score_of("10.0.0.9"), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DeceptionLayer {
    config: TrapConfig,
    ledger: ReputationLedger,
}

impl DeceptionLayer {
    /// Creates a deception layer with the given tuning.
    #[must_use]
    pub fn new(config: TrapConfig) -> Self {
        Self {
            config,
            ledger: ReputationLedger::new(),
        }
    }

    /// Handles one unmapped-path request.
    ///
    /// Scores the client, sleeps the adaptive delay, and returns the
    /// fixed decoy. Never fails: if the ledger is unavailable the
    /// update is skipped and the decoy is served without the scaled
    /// delay.
    pub async fn handle_miss(&self, client_key: &str, requested_path: &str) -> DecoyPayload {
        let prior = match self.ledger.record_miss(client_key) {
            Ok(prior) => {
                warn!(
                    client = client_key,
                    path = requested_path,
                    score = prior + 1,
                    "stale route hit, deception engaged"
                );
                prior
            }
            Err(e) => {
                warn!(client = client_key, path = requested_path, error = %e, "serving decoy unscored");
                0
            }
        };

        if prior > 0 {
            let bound = self.scaled_delay_bound(prior);
            let jitter = OsRng.gen_range(0..=bound.as_millis() as u64);
            tokio::time::sleep(Duration::from_millis(jitter)).await;
        }
        tokio::time::sleep(Duration::from_millis(self.config.base_delay_ms)).await;

        DecoyPayload::bait()
    }

    /// Upper bound of the random delay for a given prior score.
    ///
    /// Grows linearly with the score until the configured cap, so
    /// repeat offenders see non-decreasing worst-case latency.
    #[must_use]
    pub fn scaled_delay_bound(&self, prior_score: u64) -> Duration {
        let scaled = prior_score
            .saturating_mul(self.config.delay_step_ms)
            .min(self.config.max_scaled_delay_ms);
        Duration::from_millis(scaled)
    }

    /// Current suspicion score for a client.
    #[must_use]
    pub fn score_of(&self, client_key: &str) -> u64 {
        self.ledger.score_of(client_key)
    }

    /// The underlying ledger, for dashboard snapshots.
    #[must_use]
    pub fn ledger(&self) -> &ReputationLedger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoy::TRAP_MARKER;

    fn fast_trap() -> DeceptionLayer {
        DeceptionLayer::new(TrapConfig::new().with_base_delay_ms(0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_serves_decoy_and_scores() {
        let trap = DeceptionLayer::new(TrapConfig::new());

        let decoy = trap.handle_miss("10.0.0.1", "/admin/login_x99").await;
        assert_eq!(decoy.user_data.account_flag, TRAP_MARKER);
        assert_eq!(trap.score_of("10.0.0.1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_misses_accumulate() {
        let trap = DeceptionLayer::new(TrapConfig::new());

        for expected in 1..=4 {
            let decoy = trap.handle_miss("10.0.0.1", "/probe").await;
            assert_eq!(decoy, DecoyPayload::bait());
            assert_eq!(trap.score_of("10.0.0.1"), expected);
        }
    }

    #[test]
    fn test_delay_bound_is_monotone_and_capped() {
        let trap = fast_trap();
        let mut last = Duration::ZERO;
        for score in 0..20 {
            let bound = trap.scaled_delay_bound(score);
            assert!(bound >= last);
            assert!(bound <= Duration::from_millis(900));
            last = bound;
        }
        assert_eq!(trap.scaled_delay_bound(3), Duration::from_millis(300));
        assert_eq!(trap.scaled_delay_bound(50), Duration::from_millis(900));
    }

    #[test]
    fn test_delay_bound_overflow_saturates() {
        let trap = fast_trap();
        assert_eq!(
            trap.scaled_delay_bound(u64::MAX),
            Duration::from_millis(900)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_offense_skips_scaled_delay() {
        // Prior score 0 means no scaled jitter; only the base delay
        // applies. With paused time the sleep auto-advances, so the
        // assertion is on the score bookkeeping.
        let trap = DeceptionLayer::new(TrapConfig::new());
        trap.handle_miss("fresh-client", "/x").await;
        assert_eq!(trap.score_of("fresh-client"), 1);
    }
}
