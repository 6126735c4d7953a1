//! Fractional-Kelly stake sizing with a hard bankroll cap.
//!
//! Kelly formula: f* = (b*p - q) / b
//! where:
//!   b = decimal odds - 1 (net payout per dollar risked)
//!   p = model probability
//!   q = 1 - p
//!
//! The tier discounts f* (15% or 25%), then the stake fraction is capped
//! at 5% of bankroll. A pass tier or a degenerate payout short-circuits to
//! a zero stake — that is the normal path, not an error.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Tier;
use crate::odds::probability_to_decimal_odds;

/// Hard cap on the stake as a fraction of bankroll
pub const MAX_STAKE_FRACTION: f64 = 0.05;

/// Sized stake recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizedStake {
    /// Full Kelly fraction before discount and cap (zero when no bet)
    pub raw_kelly: f64,
    /// Applied fraction of bankroll after tier discount and cap
    pub stake_fraction: f64,
    /// Dollar amount against the supplied bankroll
    pub stake: Decimal,
}

impl SizedStake {
    fn zero() -> Self {
        Self {
            raw_kelly: 0.0,
            stake_fraction: 0.0,
            stake: Decimal::ZERO,
        }
    }
}

/// Size a stake for one proposition.
///
/// `implied_probability` must come from the odds converter and is used for
/// the payout term; `true_probability` is the model estimate.
pub fn size_stake(
    true_probability: f64,
    implied_probability: f64,
    tier: Tier,
    bankroll: Decimal,
) -> SizedStake {
    if !tier.is_actionable() {
        return SizedStake::zero();
    }

    let decimal_odds = match probability_to_decimal_odds(implied_probability) {
        Ok(d) => d,
        Err(_) => return SizedStake::zero(),
    };
    let b = decimal_odds - 1.0;
    if b <= 0.0 {
        debug!(b, "non-positive payout term, no bet");
        return SizedStake::zero();
    }

    let p = true_probability;
    let q = 1.0 - p;
    let raw_kelly = (b * p - q) / b;

    // Negative Kelly means the odds don't justify a bet
    if raw_kelly <= 0.0 {
        return SizedStake {
            raw_kelly,
            stake_fraction: 0.0,
            stake: Decimal::ZERO,
        };
    }

    let stake_fraction = (raw_kelly * tier.kelly_multiplier()).min(MAX_STAKE_FRACTION);
    let stake = Decimal::from_f64(stake_fraction).unwrap_or(Decimal::ZERO) * bankroll;

    SizedStake {
        raw_kelly,
        stake_fraction,
        stake,
    }
}
