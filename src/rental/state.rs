//! Situation input, round tracking and the immutable game state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::{BidConfig, BidError};
use super::market::MarketParams;
use super::payoff::PayoffEvaluator;
use super::strategy::StrategyProfile;

/// A rental situation as supplied by the caller.
///
/// Ordinals follow the questionnaire: landlord price sensitivity
/// 1 = firm, 2 = moderate, 3 = flexible; competition 1 = low, 2 = medium,
/// 3 = high; property value and risk tolerance 1-5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    /// Asking rent.
    pub listing_price: f64,
    /// Average rent of comparable units nearby.
    pub neighborhood_avg: f64,
    /// Days the listing has been up.
    pub days_on_market: u32,
    /// Landlord flexibility, 1-3.
    pub price_sens_landlord: u8,
    /// Competition level, 1-3.
    pub competitive_level: u8,
    /// Hard budget.
    pub max_budget: f64,
    /// How much the bidder wants this unit, 1-5.
    pub property_value: u8,
    /// Risk tolerance, 1-5.
    pub risk_tolerance: f64,
}

impl Situation {
    /// Check every field against the questionnaire ranges.
    ///
    /// The engine does not call this itself; it trusts its caller.
    pub fn validate(&self) -> Result<(), BidError> {
        check_positive("listing price", self.listing_price)?;
        check_positive("neighborhood average", self.neighborhood_avg)?;
        check_positive("maximum budget", self.max_budget)?;
        check_range("days on market", f64::from(self.days_on_market), 0.0, 365.0)?;
        check_range("landlord price sensitivity", f64::from(self.price_sens_landlord), 1.0, 3.0)?;
        check_range("competition level", f64::from(self.competitive_level), 1.0, 3.0)?;
        check_range("property value", f64::from(self.property_value), 1.0, 5.0)?;
        check_range("risk tolerance", self.risk_tolerance, 1.0, 5.0)?;

        let minimum = self.listing_price * 0.85;
        if self.max_budget < minimum {
            return Err(BidError::InvalidSituation(format!(
                "budget ${:.0} is too low for listing price ${:.0}; minimum recommended budget is ${:.0}",
                self.max_budget, self.listing_price, minimum
            )));
        }
        Ok(())
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), BidError> {
    if value.is_nan() || value <= 0.0 {
        return Err(BidError::InvalidSituation(format!("{} must be positive, got {}", field, value)));
    }
    Ok(())
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), BidError> {
    if !(min..=max).contains(&value) {
        return Err(BidError::InvalidSituation(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

/// What the landlord said after the previous bid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LandlordFeedback {
    /// No bid has been made yet.
    #[default]
    None,
    /// The landlord named a price.
    Counter {
        /// Price the landlord countered with.
        price: f64,
    },
    /// The landlord asked for best-and-final offers.
    Final,
    /// The bid was accepted.
    Accept,
    /// The bid was rejected.
    Reject,
}

impl LandlordFeedback {
    /// Whether this feedback leaves room for another bid.
    pub fn continues(&self) -> bool {
        matches!(self, LandlordFeedback::Counter { .. } | LandlordFeedback::Final)
    }
}

/// Bidding round. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Round {
    /// Opening bids.
    #[default]
    First,
    /// Response to a counter or a best-and-final request.
    Second,
}

impl Round {
    /// The following round, or `None` after the last one.
    pub fn advance(self) -> Option<Round> {
        match self {
            Round::First => Some(Round::Second),
            Round::Second => None,
        }
    }

    /// 1-based round number.
    pub fn number(self) -> u8 {
        match self {
            Round::First => 1,
            Round::Second => 2,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// One snapshot of the game as seen by a single strategy.
///
/// Built once per strategy from the situation and never mutated; later
/// rounds come from [`advance`](Self::advance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    // Situation
    /// Asking rent.
    pub listing_price: f64,
    /// Average rent of comparable units nearby.
    pub neighborhood_avg: f64,
    /// Days on market at the current round.
    pub days_on_market: u32,
    /// Landlord flexibility, 1-3.
    pub price_sens_landlord: u8,
    /// Competition level at the current round, 1-3.
    pub competitive_level: u8,

    // Bidder
    /// Hard budget.
    pub max_budget: f64,
    /// Desirability, 1-5.
    pub property_value: u8,
    /// Risk tolerance; fractional after strategy perturbation.
    pub risk_tolerance: f64,

    // Market and strategy weights
    /// Competitor market.
    pub market_params: MarketParams,
    /// Weight on the property desirability score.
    pub property_value_weight: f64,
    /// Weight on relative overpayment.
    pub overpayment_weight: f64,
    /// Utility charged per extra round of negotiation.
    pub negotiation_cost: f64,
    /// Share of the configured budget flexibility this strategy may use.
    pub budget_flex_share: f64,
    /// Fair market rent, fixed at round one.
    pub fair_value: f64,

    // Round tracking
    /// Current round.
    pub round: Round,
    /// Bid made in the previous round.
    pub previous_bid: Option<f64>,
    /// Landlord's answer to the previous bid.
    pub landlord_feedback: LandlordFeedback,
}

impl GameState {
    /// Opening state for a situation, with unperturbed weights.
    pub fn from_situation(situation: &Situation, market: &MarketParams, config: &BidConfig) -> Self {
        let fair_value = PayoffEvaluator::fair_market_value(
            situation.listing_price,
            situation.neighborhood_avg,
            market,
            situation.days_on_market,
        );

        Self {
            listing_price: situation.listing_price,
            neighborhood_avg: situation.neighborhood_avg,
            days_on_market: situation.days_on_market,
            price_sens_landlord: situation.price_sens_landlord,
            competitive_level: situation.competitive_level,
            max_budget: situation.max_budget,
            property_value: situation.property_value,
            risk_tolerance: situation.risk_tolerance,
            market_params: *market,
            property_value_weight: config.property_value_weight,
            overpayment_weight: config.overpayment_weight,
            negotiation_cost: 0.0,
            budget_flex_share: 1.0,
            fair_value,
            round: Round::First,
            previous_bid: None,
            landlord_feedback: LandlordFeedback::None,
        }
    }

    /// Copy with a strategy's risk and weight perturbations applied.
    pub fn with_profile(&self, profile: &StrategyProfile, config: &BidConfig) -> Self {
        Self {
            risk_tolerance: self.risk_tolerance + profile.risk_offset,
            property_value_weight: config.property_value_weight * profile.property_value_multiplier,
            overpayment_weight: config.overpayment_weight * profile.overpayment_multiplier,
            negotiation_cost: profile.negotiation_cost,
            budget_flex_share: profile.budget_flex_share,
            ..self.clone()
        }
    }

    /// State after the landlord answers `bid` with `feedback`.
    ///
    /// Competition tightens by one level and time passes. Returns `None`
    /// when there is no further round or the feedback ends the game.
    pub fn advance(&self, bid: f64, feedback: LandlordFeedback, config: &BidConfig) -> Option<Self> {
        if !feedback.continues() {
            return None;
        }
        let round = self.round.advance()?;

        Some(Self {
            round,
            previous_bid: Some(bid),
            landlord_feedback: feedback,
            competitive_level: self.competitive_level.saturating_add(1).min(3),
            days_on_market: self.days_on_market.saturating_add(config.days_between_rounds),
            ..self.clone()
        })
    }

    /// Highest bid this strategy may place.
    pub fn budget_ceiling(&self, config: &BidConfig) -> f64 {
        self.max_budget * (1.0 + self.budget_flex_share * config.budget_flexibility)
    }

    /// Price the landlord is currently asking.
    pub fn asking_price(&self) -> f64 {
        match self.landlord_feedback {
            LandlordFeedback::Counter { price } => price,
            _ => self.listing_price,
        }
    }

    /// Rounds of negotiation beyond the first.
    pub fn extra_rounds(&self) -> f64 {
        f64::from(self.round.number() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::strategy::StrategyLabel;
    use crate::rental::test_support::scenario;

    #[test]
    fn test_validate_accepts_scenario() {
        assert!(scenario().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_fields() {
        let mut s = scenario();
        s.price_sens_landlord = 4;
        assert!(matches!(s.validate(), Err(BidError::InvalidSituation(_))));

        let mut s = scenario();
        s.days_on_market = 400;
        assert!(s.validate().is_err());

        let mut s = scenario();
        s.listing_price = 0.0;
        assert!(s.validate().is_err());

        let mut s = scenario();
        s.max_budget = 1800.0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("too low"), "{}", err);
    }

    #[test]
    fn test_round_only_moves_forward() {
        assert_eq!(Round::First.advance(), Some(Round::Second));
        assert_eq!(Round::Second.advance(), None);
        assert!(Round::First < Round::Second);
    }

    #[test]
    fn test_advance_tightens_competition() {
        let config = BidConfig::default();
        let base = GameState::from_situation(&scenario(), &MarketParams::new(0.98, 0.05, 0.0), &config);
        assert_eq!(base.round, Round::First);
        assert!((base.fair_value - 2101.176).abs() < 1e-6);

        let next = base
            .advance(2150.0, LandlordFeedback::Counter { price: 2200.0 }, &config)
            .unwrap();
        assert_eq!(next.round, Round::Second);
        assert_eq!(next.previous_bid, Some(2150.0));
        assert_eq!(next.competitive_level, 3);
        assert_eq!(next.days_on_market, 10);
        assert_eq!(next.asking_price(), 2200.0);
        assert_eq!(next.fair_value, base.fair_value);

        // Round two is the last one, and accept/reject end the game.
        assert!(next.advance(2200.0, LandlordFeedback::Final, &config).is_none());
        assert!(base.advance(2150.0, LandlordFeedback::Accept, &config).is_none());
        assert!(base.advance(2150.0, LandlordFeedback::Reject, &config).is_none());
    }

    #[test]
    fn test_advance_saturates_at_the_limits() {
        let config = BidConfig::default();
        let base = GameState {
            competitive_level: u8::MAX,
            days_on_market: u32::MAX,
            ..GameState::from_situation(&scenario(), &MarketParams::downtown(), &config)
        };
        let next = base.advance(2150.0, LandlordFeedback::Final, &config).unwrap();
        assert_eq!(next.competitive_level, 3);
        assert_eq!(next.days_on_market, u32::MAX);
    }

    #[test]
    fn test_profile_copies_do_not_share_state() {
        let config = BidConfig::default();
        let base = GameState::from_situation(&scenario(), &MarketParams::downtown(), &config);
        let conservative = base.with_profile(&StrategyLabel::Conservative.profile(), &config);
        let aggressive = base.with_profile(&StrategyLabel::Aggressive.profile(), &config);

        assert_eq!(base.risk_tolerance, 3.0);
        assert_eq!(conservative.risk_tolerance, 1.5);
        assert_eq!(aggressive.risk_tolerance, 4.5);
        assert!((conservative.overpayment_weight - 0.78).abs() < 1e-12);
        assert!((aggressive.property_value_weight - 1.2).abs() < 1e-12);
        assert_eq!(conservative.budget_ceiling(&config), 2500.0);
        assert!((aggressive.budget_ceiling(&config) - 2750.0).abs() < 1e-9);
    }

    #[test]
    fn test_feedback_json_shape() {
        let counter: LandlordFeedback =
            serde_json::from_str(r#"{ "kind": "counter", "price": 2300.0 }"#).unwrap();
        assert_eq!(counter, LandlordFeedback::Counter { price: 2300.0 });
        let fin: LandlordFeedback = serde_json::from_str(r#"{ "kind": "final" }"#).unwrap();
        assert_eq!(fin, LandlordFeedback::Final);
    }
}
