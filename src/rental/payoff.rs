//! Utility of resolved outcomes.

use crate::search::Outcome;

use super::config::BidConfig;
use super::market::{MarketCondition, MarketParams};
use super::state::GameState;

/// Every utility the evaluator returns lies in `[-UTILITY_BOUND, UTILITY_BOUND]`.
pub const UTILITY_BOUND: f64 = 4.0;

/// Property value ordinals are scored out of this.
const PROPERTY_VALUE_SCALE: f64 = 5.0;

/// Scores wins, losses and unfinished negotiations for the bidder.
#[derive(Debug, Clone)]
pub struct PayoffEvaluator {
    config: BidConfig,
}

impl PayoffEvaluator {
    /// Create the evaluator.
    pub fn new(config: BidConfig) -> Self {
        Self { config }
    }

    /// Fair monthly rent for the unit.
    ///
    /// In cool markets the neighbourhood average carries more weight than
    /// the listing; otherwise the market-adjusted listing dominates. Stale
    /// listings are discounted.
    pub fn fair_market_value(
        listing_price: f64,
        neighborhood_avg: f64,
        market: &MarketParams,
        days_on_market: u32,
    ) -> f64 {
        let condition = market.condition();
        let adjusted_listing = market.median_ratio * listing_price;
        let blended = if condition.is_cool() {
            0.4 * adjusted_listing + 0.6 * neighborhood_avg
        } else {
            0.7 * adjusted_listing + 0.3 * neighborhood_avg
        };
        blended * Self::staleness_discount(condition, days_on_market)
    }

    /// Multiplier on fair value for time on market.
    pub fn staleness_discount(condition: MarketCondition, days_on_market: u32) -> f64 {
        let (week, fortnight, month, older) = match condition {
            MarketCondition::VeryCool => (0.98, 0.95, 0.90, 0.85),
            MarketCondition::Cooling => (0.99, 0.97, 0.93, 0.88),
            MarketCondition::Balanced => (1.0, 0.98, 0.95, 0.92),
            MarketCondition::VeryHot => (1.0, 0.99, 0.97, 0.95),
        };
        match days_on_market {
            0..=7 => week,
            8..=14 => fortnight,
            15..=30 => month,
            _ => older,
        }
    }

    /// Utility of a resolved bid: won or lost, before negotiation cost.
    ///
    /// A win is worth the weighted desirability score minus the weighted
    /// relative overpayment, the latter discounted a little for bidders with
    /// high risk tolerance. A loss costs a fixed share of the desirability
    /// score, so it always ranks below a win at a fair price.
    pub fn evaluate(&self, state: &GameState, bid: f64, won: bool) -> f64 {
        let property_score =
            state.property_value_weight * f64::from(state.property_value) / PROPERTY_VALUE_SCALE;
        if !won {
            return -self.config.loss_penalty * property_score;
        }

        let fair = state.fair_value;
        let overpayment = (bid - fair).max(0.0) / fair;
        let risk = state.risk_tolerance.clamp(1.0, 5.0);
        let risk_adjustment = 1.0 - self.config.risk_discount * (risk - 3.0);

        property_score
            - state.overpayment_weight * self.config.overpayment_scale * overpayment * risk_adjustment
    }

    /// Utility of winning at `bid` in the state's round.
    pub fn win_utility(&self, state: &GameState, bid: f64) -> f64 {
        let u = self.evaluate(state, bid, true) - state.negotiation_cost * state.extra_rounds();
        u.clamp(-UTILITY_BOUND, UTILITY_BOUND)
    }

    /// Utility of losing the unit.
    pub fn loss_utility(&self, state: &GameState) -> f64 {
        self.evaluate(state, 0.0, false).clamp(-UTILITY_BOUND, UTILITY_BOUND)
    }

    /// Value of negotiation that the search does not follow further.
    ///
    /// A fixed share of wins at `bid`, the rest losses, minus one more round
    /// of negotiation cost.
    pub fn negotiation_leaf(&self, state: &GameState, bid: f64) -> Outcome {
        let share = self.config.negotiation_win_share;
        let utility = share * self.win_utility(state, bid) + (1.0 - share) * self.loss_utility(state)
            - state.negotiation_cost;
        Outcome {
            utility: utility.clamp(-UTILITY_BOUND, UTILITY_BOUND),
            win_probability: share,
        }
    }
}
