//! Economy scoring.
//!
//! Working-age people (20..60) who are not mobilized produce money; everyone
//! else costs a little:
//!
//! money_made = 0.25 × producers − 0.1 × non-producers
//!
//! The score compares the long-run average income against this month's:
//!
//! score = (tanh((average / money_made) / 10) + 1) × 100
//!
//! which lands in `[0, 200]` and sits near 100 for a steady economy. The
//! running average lives in an [`EconomyHistory`] owned by each faction, so
//! scoring has no hidden state.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::game::PopulationPyramid;

/// Youngest age that produces money.
pub const MONEY_PRODUCING_AGE_MIN: u8 = 20;

/// Age at which people stop producing money (exclusive).
pub const MONEY_PRODUCING_AGE_MAX: u8 = 60;

/// Money made per producing person per month.
const PRODUCER_OUTPUT: f64 = 0.25;

/// Money consumed per non-producing person per month.
const DEPENDENT_COST: f64 = 0.1;

/// Incremental mean of every month's income.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EconomyHistory {
    average: f64,
    samples: u64,
}

impl EconomyHistory {
    /// Fold one month's income into the mean.
    pub fn record(&mut self, money_made: f64) {
        self.samples += 1;
        self.average += (money_made - self.average) / self.samples as f64;
    }

    /// Mean income so far (0 before any sample).
    #[must_use]
    pub const fn average(&self) -> f64 {
        self.average
    }

    /// Months recorded.
    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }
}

/// Outcome of scoring one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EconomyScore {
    /// Trend score in `[0, 200]`.
    pub score: u32,
    /// Income this month; negative when dependents outweigh producers.
    pub money_made: i64,
}

/// Producers and non-producers for a pyramid at a mobilization target.
#[must_use]
pub fn workforce(pyramid: &PopulationPyramid, target_mobilization: u8) -> (f64, f64) {
    let working_age: u64 = pyramid
        .bands()
        .iter()
        .filter(|band| band.age >= MONEY_PRODUCING_AGE_MIN && band.age < MONEY_PRODUCING_AGE_MAX)
        .map(|band| band.total())
        .sum();
    let total = pyramid.total_population() as f64;
    let producing = working_age as f64 * (1.0 - f64::from(target_mobilization.min(100)) / 100.0);
    (producing, total - producing)
}

/// Squash the average-to-current income ratio into `[0, 200]`.
///
/// Zero income follows IEEE division: a positive average gives 200, a
/// negative one 0, and `0 / 0` (NaN) saturates to 0.
#[must_use]
pub fn trend_score(average: f64, money_made: f64) -> u32 {
    let ratio = average / money_made;
    (((ratio / 10.0).tanh() + 1.0) * 100.0) as u32
}

/// Score this month's economy and fold its income into `history`.
pub fn economy_score(
    pyramid: &PopulationPyramid,
    target_mobilization: u8,
    history: &mut EconomyHistory,
) -> EconomyScore {
    let (producing, unproducing) = workforce(pyramid, target_mobilization);
    let money_made = producing * PRODUCER_OUTPUT - unproducing * DEPENDENT_COST;
    history.record(money_made);

    EconomyScore {
        score: trend_score(history.average(), money_made),
        money_made: money_made as i64,
    }
}
