//! The rental bidding game.
//!
//! A bidder, an aggregate of competing bidders and a landlord:
//!
//! - [`BidDistributionModel`] supplies the bidder's candidate ladders and the
//!   chance of leading the competition (an order statistic over log-normal
//!   competing bids).
//! - [`LandlordModel`] maps a leading bid to accept / counter / request-final
//!   / reject probabilities.
//! - [`PayoffEvaluator`] scores wins, losses and unfinished negotiations.
//! - [`RentalGame`] ties the three together behind [`crate::search::Game`].
//! - [`StrategyGenerator`] runs the search once per strategy and packages
//!   the results as [`Recommendation`]s.

pub mod config;
pub mod distribution;
pub mod game;
pub mod landlord;
pub mod market;
pub mod output;
pub mod payoff;
pub mod state;
pub mod strategy;

pub use config::{BidConfig, BidError};
pub use distribution::{BidDistributionModel, CeilingDistribution, CompetitorOutcome};
pub use game::{BidCandidate, Position, RentalGame};
pub use landlord::{ActionDistribution, LandlordAction, LandlordModel};
pub use market::{MarketCondition, MarketError, MarketParams, MarketTable, MarketThresholds};
pub use output::{ListingFreshness, MarketAnalysis, RecommendationReport};
pub use payoff::{PayoffEvaluator, UTILITY_BOUND};
pub use state::{GameState, LandlordFeedback, Round, Situation};
pub use strategy::{Confidence, Recommendation, StrategyGenerator, StrategyLabel, StrategyProfile};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{MarketParams, Situation};

    /// Mid-priced unit, a week on market, moderate landlord and competition.
    pub fn scenario() -> Situation {
        Situation {
            listing_price: 2200.0,
            neighborhood_avg: 2100.0,
            days_on_market: 7,
            price_sens_landlord: 2,
            competitive_level: 2,
            max_budget: 2500.0,
            property_value: 4,
            risk_tolerance: 3.0,
        }
    }

    /// Median slightly under listing, tight spread.
    pub fn cooling_market() -> MarketParams {
        MarketParams::new(0.98, 0.05, 0.0)
    }
}
