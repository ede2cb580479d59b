//! Competitor-bid model: the ceiling over N competing bids and the candidate ladders.
//!
//! Competing bids are i.i.d. draws of `bid / listing` from a log-normal
//! located at the market median. The ceiling over N draws has CDF `F(x)^N`.
//! A non-zero market skew replaces the single log-normal with a two-part
//! mixture: positive skew mixes in a wider component above the median,
//! negative skew a tighter one below it.

use serde::{Deserialize, Serialize};

use super::config::BidConfig;
use super::market::MarketParams;
use super::state::{GameState, LandlordFeedback, Round};

/// Skew below this magnitude is treated as zero.
const SKEW_EPSILON: f64 = 0.01;

/// Ladder centre moves by this ratio per risk-tolerance step away from 3.
const LADDER_RISK_STEP: f64 = 0.01;
/// Ladder width at risk tolerance 1.
const LADDER_BASE_WIDTH: f64 = 0.03;
/// Extra ladder width per risk-tolerance step above 1.
const LADDER_WIDTH_STEP: f64 = 0.005;

/// Complementary error function.
///
/// Chebyshev fit with fractional error below 1.2e-7 everywhere.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Log-normal CDF with shape `sigma` and median `scale`.
pub fn lognormal_cdf(x: f64, sigma: f64, scale: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    normal_cdf((x / scale).ln() / sigma)
}

/// Distribution of the highest competing bid, as a ratio of the listing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CeilingDistribution {
    /// Number of competing bidders.
    pub competitors: u32,
    /// Median of a single competing bid ratio.
    pub median: f64,
    /// Log-normal shape of a single competing bid ratio.
    pub dispersion: f64,
    /// Mixture skew in [-1, 1].
    pub skew: f64,
}

impl CeilingDistribution {
    /// Whether there is no competitor to beat.
    pub fn is_uncontested(&self) -> bool {
        self.competitors == 0
    }

    /// CDF of a single competing bid ratio.
    pub fn single_cdf(&self, ratio: f64) -> f64 {
        let (m, s) = (self.median, self.dispersion);
        let base = lognormal_cdf(ratio, s, m);
        if self.skew.abs() < SKEW_EPSILON {
            return base;
        }

        if self.skew > 0.0 {
            let w = 0.8 - 0.3 * self.skew.min(1.0);
            w * base + (1.0 - w) * lognormal_cdf(ratio, 1.5 * s, 1.1 * m)
        } else {
            let w = 0.8 + 0.3 * self.skew.max(-1.0);
            w * base + (1.0 - w) * lognormal_cdf(ratio, 0.7 * s, 0.95 * m)
        }
    }

    /// Probability that every competitor bids at most `ratio`.
    ///
    /// With no competitors the ceiling is always beaten.
    pub fn cdf(&self, ratio: f64) -> f64 {
        if self.is_uncontested() {
            return 1.0;
        }
        let n = i32::try_from(self.competitors).unwrap_or(i32::MAX);
        self.single_cdf(ratio).powi(n).clamp(0.0, 1.0)
    }
}

/// Where the bidder stands against the competitor ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitorOutcome {
    /// Ahead of every competitor by more than the narrow-lead margin.
    ClearLead,
    /// Ahead, but some competitor is within the margin.
    NarrowLead,
    /// Some competitor bid more; the bidder is out.
    Outbid,
}

/// Competitor ceiling model and candidate-bid ladders.
#[derive(Debug, Clone)]
pub struct BidDistributionModel {
    config: BidConfig,
}

impl BidDistributionModel {
    /// Create the model.
    pub fn new(config: BidConfig) -> Self {
        Self { config }
    }

    /// Ceiling distribution for a competition level.
    ///
    /// Level `k` brings `competitors_per_level[k - 1]` bidders and widens
    /// their dispersion by `dispersion_step` per level above 1.
    pub fn competitor_ceiling_distribution(
        &self,
        competitive_level: u8,
        market: &MarketParams,
    ) -> CeilingDistribution {
        let level = competitive_level.clamp(1, 3);
        let widening = 1.0 + self.config.dispersion_step * f64::from(level - 1);
        CeilingDistribution {
            competitors: self.config.competitors_at(level),
            median: market.median_ratio,
            dispersion: market.dispersion * widening,
            skew: market.skew,
        }
    }

    /// Split the ceiling distribution at a bid ratio into clear lead,
    /// narrow lead and outbid. The three masses sum to 1.
    pub fn outcome_buckets(
        &self,
        ceiling: &CeilingDistribution,
        bid_ratio: f64,
    ) -> [(CompetitorOutcome, f64); 3] {
        let ahead = ceiling.cdf(bid_ratio);
        let clear = ceiling.cdf(bid_ratio * (1.0 - self.config.narrow_lead_margin)).min(ahead);
        [
            (CompetitorOutcome::ClearLead, clear),
            (CompetitorOutcome::NarrowLead, ahead - clear),
            (CompetitorOutcome::Outbid, 1.0 - ahead),
        ]
    }

    /// Round-one ladder of candidate bid-to-listing ratios.
    ///
    /// Centred on the market median, shifted by market condition and by
    /// `0.01` per risk step; wider for higher risk. Clipped to the configured
    /// ratio range and to `cap_ratio`. If clipping leaves nothing, the single
    /// ratio nearest the cap is returned.
    pub fn dynamic_bid_range(&self, risk_tolerance: f64, market: &MarketParams, cap_ratio: f64) -> Vec<f64> {
        let center = market.median_ratio
            + market.condition().ladder_shift()
            + LADDER_RISK_STEP * (risk_tolerance - 3.0);
        let width = LADDER_BASE_WIDTH + LADDER_WIDTH_STEP * (risk_tolerance - 1.0);

        let lo = (center - width / 2.0).max(self.config.min_bid_ratio);
        let hi = (center + width / 2.0)
            .min(self.config.max_bid_ratio)
            .min(cap_ratio)
            .max(0.0);

        if lo >= hi {
            return vec![hi];
        }
        linspace(lo, hi, self.config.ladder_size)
    }

    /// Candidate bids for a MAX node, ordered nearest the market median first.
    ///
    /// Every bid lies in `[0, budget ceiling]`. The list is empty only when a
    /// second round has no feasible bid (the previous bid is already above
    /// the ceiling).
    pub fn candidate_bids(&self, state: &GameState) -> Vec<f64> {
        let cap = state.budget_ceiling(&self.config);
        let listing = state.listing_price;

        let mut bids: Vec<f64> = match state.round {
            Round::First => self
                .dynamic_bid_range(state.risk_tolerance, &state.market_params, cap / listing)
                .into_iter()
                .map(|ratio| ratio * listing)
                .collect(),
            Round::Second => self.round_two_ladder(state, cap),
        };
        bids.retain(|&bid| bid <= cap + 1e-9);

        let target = state.market_params.median_ratio * listing;
        bids.sort_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()));
        bids
    }

    /// Second-round bids, starting from the previous bid.
    ///
    /// After a counter: evenly spaced up to the counter price. After a
    /// best-and-final request: stand pat, or raise by a band that grows with
    /// risk tolerance (1-4% at risk 1, up to 3-10% at risk 5).
    fn round_two_ladder(&self, state: &GameState, cap: f64) -> Vec<f64> {
        let prev = state.previous_bid.unwrap_or(state.listing_price);
        let n = self.config.ladder_size;

        match state.landlord_feedback {
            LandlordFeedback::Counter { price } => {
                let top = price.min(cap).max(prev);
                if top > prev {
                    linspace(prev, top, n)
                } else {
                    vec![prev]
                }
            }
            _ => {
                let r = state.risk_tolerance;
                let lo = prev * (1.0 + 0.01 + 0.005 * (r - 1.0));
                let hi = (prev * (1.0 + 0.04 + 0.015 * (r - 1.0))).min(cap);
                let mut bids = vec![prev];
                if hi > lo {
                    bids.extend(linspace(lo, hi, n - 1));
                }
                bids
            }
        }
    }
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::test_support::{cooling_market, scenario};

    fn model() -> BidDistributionModel {
        BidDistributionModel::new(BidConfig::default())
    }

    #[test]
    fn test_erfc_known_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!((erfc(1.0) - 0.157_299_207).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842_700_793).abs() < 1e-6);
        assert!((normal_cdf(1.959_964) - 0.975).abs() < 1e-6);
        assert_eq!(lognormal_cdf(0.0, 0.05, 1.0), 0.0);
        assert!((lognormal_cdf(0.98, 0.05, 0.98) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ceiling_is_power_of_single_cdf() {
        let market = MarketParams::new(1.0, 0.06, 0.0);
        let ceiling = model().competitor_ceiling_distribution(3, &market);
        assert_eq!(ceiling.competitors, 2);
        assert!((ceiling.dispersion - 0.06 * 1.3).abs() < 1e-12);

        for ratio in [0.9, 1.0, 1.05, 1.2] {
            let single = ceiling.single_cdf(ratio);
            assert!((ceiling.cdf(ratio) - single * single).abs() < 1e-12);
        }
        // The more competitors, the less likely a given bid beats them all.
        let fewer = model().competitor_ceiling_distribution(2, &market);
        assert!(ceiling.cdf(1.02) < fewer.cdf(1.02));
    }

    #[test]
    fn test_zero_competitors_always_beaten() {
        let ceiling = model().competitor_ceiling_distribution(1, &cooling_market());
        assert!(ceiling.is_uncontested());
        assert_eq!(ceiling.cdf(0.5), 1.0);

        let buckets = model().outcome_buckets(&ceiling, 0.5);
        assert_eq!(buckets[0], (CompetitorOutcome::ClearLead, 1.0));
        assert_eq!(buckets[2], (CompetitorOutcome::Outbid, 0.0));
    }

    #[test]
    fn test_skew_shifts_mass_upwards() {
        let plain = CeilingDistribution { competitors: 1, median: 1.0, dispersion: 0.08, skew: 0.0 };
        let right = CeilingDistribution { skew: 0.5, ..plain };
        let left = CeilingDistribution { skew: -0.5, ..plain };
        // Positive skew makes high competing bids more likely.
        assert!(right.cdf(1.1) < plain.cdf(1.1));
        assert!(left.cdf(1.0) > plain.cdf(1.0));
        // A tiny skew is ignored.
        let tiny = CeilingDistribution { skew: 0.005, ..plain };
        assert_eq!(tiny.cdf(1.03), plain.cdf(1.03));
    }

    #[test]
    fn test_buckets_sum_to_one() {
        let m = model();
        for level in 1..=3 {
            for market in [MarketParams::downtown(), MarketParams::burnaby(), MarketParams::new(1.08, 0.12, -0.4)] {
                let ceiling = m.competitor_ceiling_distribution(level, &market);
                for ratio in [0.0, 0.8, 0.93, 1.0, 1.1, 1.3, 2.0] {
                    let buckets = m.outcome_buckets(&ceiling, ratio);
                    let total: f64 = buckets.iter().map(|(_, p)| p).sum();
                    assert!((total - 1.0).abs() < 1e-12, "total {} at ratio {}", total, ratio);
                    assert!(buckets.iter().all(|(_, p)| (0.0..=1.0).contains(p)));
                }
            }
        }
    }

    #[test]
    fn test_ladder_moves_up_with_risk() {
        let m = model();
        let market = cooling_market();
        let low = m.dynamic_bid_range(1.5, &market, 2.0);
        let mid = m.dynamic_bid_range(3.0, &market, 2.0);
        let high = m.dynamic_bid_range(4.5, &market, 2.0);

        assert_eq!(mid.len(), 7);
        assert!((mid[0] - 0.95).abs() < 1e-12);
        assert!((mid[6] - 0.99).abs() < 1e-12);
        assert!(low.first().unwrap() < mid.first().unwrap());
        assert!(mid.first().unwrap() < high.first().unwrap());
        assert!(low.last().unwrap() < mid.last().unwrap());
        assert!(mid.last().unwrap() < high.last().unwrap());

        let width = |ladder: &[f64]| ladder[ladder.len() - 1] - ladder[0];
        assert!(width(&low) < width(&mid) && width(&mid) < width(&high));
    }

    #[test]
    fn test_ladder_collapses_to_cap() {
        // Budget far below listing: a single bid at the ceiling.
        let ladder = model().dynamic_bid_range(3.0, &cooling_market(), 1500.0 / 2200.0);
        assert_eq!(ladder.len(), 1);
        assert!((ladder[0] * 2200.0 - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_ordered_by_distance_to_median() {
        let config = BidConfig::default();
        let state = GameState::from_situation(&scenario(), &cooling_market(), &config);
        let bids = model().candidate_bids(&state);
        let target = 0.98 * 2200.0;
        for pair in bids.windows(2) {
            assert!((pair[0] - target).abs() <= (pair[1] - target).abs());
        }
        assert!(bids.iter().all(|&b| b <= state.budget_ceiling(&config)));
    }

    #[test]
    fn test_round_two_ladders() {
        let config = BidConfig::default();
        let base = GameState::from_situation(&scenario(), &cooling_market(), &config);

        let countered = base
            .advance(2100.0, LandlordFeedback::Counter { price: 2200.0 }, &config)
            .unwrap();
        let bids = model().candidate_bids(&countered);
        assert_eq!(bids.len(), 7);
        assert!(bids.iter().all(|&b| (2100.0..=2200.0 + 1e-9).contains(&b)));

        let finals = base.advance(2000.0, LandlordFeedback::Final, &config).unwrap();
        let bids = model().candidate_bids(&finals);
        assert_eq!(bids.len(), 7);
        assert!(bids.contains(&2000.0));
        assert!(bids.iter().all(|&b| (2000.0..=2000.0 * 1.07 + 1e-9).contains(&b)));

        // Previous bid already above the ceiling: nothing feasible.
        let over = base.advance(2800.0, LandlordFeedback::Final, &config).unwrap();
        assert!(model().candidate_bids(&over).is_empty());
    }
}
