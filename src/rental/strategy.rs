//! Three risk-differentiated recommendations from one situation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::search::{ExpectiminimaxSolver, SearchResult};

use super::config::{BidConfig, BidError};
use super::game::{BidCandidate, Position, RentalGame};
use super::landlord::LandlordAction;
use super::market::MarketParams;
use super::state::{GameState, LandlordFeedback, Round, Situation};

/// One of the three strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyLabel {
    /// Lower bids, lower win probability.
    Conservative,
    /// The situation as given.
    Balanced,
    /// Higher bids, higher win probability.
    Aggressive,
}

impl StrategyLabel {
    /// All strategies, least aggressive first.
    pub const ALL: [StrategyLabel; 3] = [
        StrategyLabel::Conservative,
        StrategyLabel::Balanced,
        StrategyLabel::Aggressive,
    ];

    /// Perturbations applied to the base situation.
    pub fn profile(self) -> StrategyProfile {
        match self {
            StrategyLabel::Conservative => StrategyProfile {
                risk_offset: -1.5,
                overpayment_multiplier: 1.3,
                property_value_multiplier: 0.9,
                negotiation_cost: 0.10,
                budget_flex_share: 0.0,
            },
            StrategyLabel::Balanced => StrategyProfile {
                risk_offset: 0.0,
                overpayment_multiplier: 1.0,
                property_value_multiplier: 1.0,
                negotiation_cost: 0.05,
                budget_flex_share: 0.5,
            },
            StrategyLabel::Aggressive => StrategyProfile {
                risk_offset: 1.5,
                overpayment_multiplier: 0.7,
                property_value_multiplier: 1.2,
                negotiation_cost: 0.02,
                budget_flex_share: 1.0,
            },
        }
    }

    /// One-line description for reports.
    pub fn description(self) -> &'static str {
        match self {
            StrategyLabel::Conservative => "Bid below the market median and accept a lower chance of winning",
            StrategyLabel::Balanced => "Trade win probability against overpayment at the market median",
            StrategyLabel::Aggressive => "Bid above the market to secure the unit",
        }
    }
}

impl fmt::Display for StrategyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyLabel::Conservative => "conservative",
            StrategyLabel::Balanced => "balanced",
            StrategyLabel::Aggressive => "aggressive",
        };
        write!(f, "{}", name)
    }
}

/// Risk and weight perturbations for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    /// Added to the bidder's risk tolerance.
    pub risk_offset: f64,
    /// Multiplies the overpayment weight.
    pub overpayment_multiplier: f64,
    /// Multiplies the property-value weight.
    pub property_value_multiplier: f64,
    /// Utility charged per extra round of negotiation.
    pub negotiation_cost: f64,
    /// Share of the budget flexibility the strategy may use.
    pub budget_flex_share: f64,
}

/// How clearly the recommended bid beat the other candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Little separation, a single candidate, or a fallback bid.
    Low,
    /// Moderate separation.
    Medium,
    /// Wide separation.
    High,
}

impl Confidence {
    /// Label for the best candidate's margin over the mean of the rest.
    pub fn from_dominance(dominance: f64, candidates: usize, config: &BidConfig) -> Self {
        if candidates < 2 {
            Confidence::Low
        } else if dominance >= config.high_confidence_margin {
            Confidence::High
        } else if dominance >= config.medium_confidence_margin {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        write!(f, "{}", name)
    }
}

/// A bid recommendation for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Which strategy produced it.
    pub strategy: StrategyLabel,
    /// Recommended monthly bid.
    pub bid: f64,
    /// Probability the bid ultimately wins the unit.
    pub win_probability: f64,
    /// Bid minus fair market value; negative means savings.
    pub expected_overpayment_or_savings: f64,
    /// Bid as a percentage of the listing price.
    pub narrative_ratio: f64,
    /// Confidence label.
    pub confidence: Confidence,
    /// Expected utility of the bid.
    pub expected_utility: f64,
    /// Fair market value the bid was measured against.
    pub fair_value: f64,
    /// Most likely landlord reaction.
    pub likely_response: LandlordAction,
    /// Round the bid is for.
    pub round: Round,
    /// Whether no candidate was feasible and a floor bid was substituted.
    pub fallback: bool,
}

impl Recommendation {
    /// Whether the landlord is expected to keep negotiating.
    pub fn requires_negotiation(&self) -> bool {
        self.likely_response.continues()
    }
}

/// One strategy's search, held until the three are put in order.
struct StrategyRun {
    state: GameState,
    result: SearchResult<f64>,
    recommendation: Recommendation,
}

/// Produces conservative, balanced and aggressive recommendations.
///
/// Bids and win probabilities never decrease from conservative to
/// aggressive.
///
/// # Example
/// ```
/// use rental_bid_solver::rental::{BidConfig, MarketParams, Situation, StrategyGenerator};
///
/// let generator = StrategyGenerator::new(BidConfig::default()).unwrap();
/// let situation = Situation {
///     listing_price: 2200.0,
///     neighborhood_avg: 2100.0,
///     days_on_market: 7,
///     price_sens_landlord: 2,
///     competitive_level: 2,
///     max_budget: 2500.0,
///     property_value: 4,
///     risk_tolerance: 3.0,
/// };
/// let [conservative, balanced, aggressive] = generator
///     .generate_three_strategies(&situation, &MarketParams::downtown())
///     .unwrap();
/// assert!(conservative.bid <= balanced.bid && balanced.bid <= aggressive.bid);
/// ```
#[derive(Debug, Clone)]
pub struct StrategyGenerator {
    config: BidConfig,
}

impl StrategyGenerator {
    /// Create a generator after validating the configuration.
    pub fn new(config: BidConfig) -> Result<Self, BidError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &BidConfig {
        &self.config
    }

    /// Round-one recommendations, least aggressive first.
    pub fn generate_three_strategies(
        &self,
        situation: &Situation,
        market: &MarketParams,
    ) -> Result<[Recommendation; 3], BidError> {
        market.validate()?;
        let base = GameState::from_situation(situation, market, &self.config);
        Ok(self.run(&base))
    }

    /// Round-two recommendations after the landlord answered `round_one_bid`.
    ///
    /// Only a counter or a best-and-final request opens a second round.
    pub fn round_two(
        &self,
        situation: &Situation,
        market: &MarketParams,
        round_one_bid: f64,
        feedback: LandlordFeedback,
    ) -> Result<[Recommendation; 3], BidError> {
        market.validate()?;
        if let LandlordFeedback::Counter { price } = feedback {
            if price.is_nan() || price <= 0.0 {
                return Err(BidError::InvalidSituation(format!(
                    "counter price must be positive, got {}",
                    price
                )));
            }
        }

        let base = GameState::from_situation(situation, market, &self.config)
            .advance(round_one_bid, feedback, &self.config)
            .ok_or(BidError::NoFurtherRound(feedback))?;
        Ok(self.run(&base))
    }

    fn run(&self, base: &GameState) -> [Recommendation; 3] {
        let [conservative, balanced, aggressive] = StrategyLabel::ALL;
        let runs = if self.config.parallel {
            let (c, (b, a)) = rayon::join(
                || self.search(base, conservative),
                || {
                    rayon::join(
                        || self.search(base, balanced),
                        || self.search(base, aggressive),
                    )
                },
            );
            [c, b, a]
        } else {
            StrategyLabel::ALL.map(|label| self.search(base, label))
        };
        self.in_order(runs)
    }

    /// Search one strategy on its own copy of the base state.
    fn search(&self, base: &GameState, label: StrategyLabel) -> StrategyRun {
        let state = base.with_profile(&label.profile(), &self.config);
        let game = RentalGame::new(self.config.clone());
        let mut solver = ExpectiminimaxSolver::new(game, self.config.search.clone());
        let root = Position::Bidding(state.clone());

        let result = solver.solve(&root);
        debug!(
            strategy = %label,
            round = %state.round,
            candidates = result.candidates.len(),
            nodes = result.stats.nodes(),
            leaves = result.stats.leaves,
            cutoffs = result.stats.cutoffs,
            pruned = result.stats.pruned_branches,
            "strategy searched"
        );

        let recommendation = match &result.best {
            Some(best) => {
                let confidence = self.confidence(&result, best.mv);
                self.recommendation(solver.game(), label, &state, best, confidence, false)
            }
            None => {
                let bid = self.fallback_bid(&state);
                warn!(
                    strategy = %label,
                    bid,
                    ceiling = state.budget_ceiling(&self.config),
                    "no feasible candidate bid, using fallback"
                );
                let outcome = solver.evaluate_move(&root, &bid);
                let candidate = BidCandidate {
                    mv: bid,
                    utility: outcome.utility,
                    win_probability: outcome.win_probability,
                };
                self.recommendation(solver.game(), label, &state, &candidate, Confidence::Low, true)
            }
        };

        StrategyRun {
            state,
            result,
            recommendation,
        }
    }

    /// Conservative, balanced, aggressive: neither the bid nor the win
    /// probability may drop from one strategy to the next.
    fn in_order(&self, runs: [StrategyRun; 3]) -> [Recommendation; 3] {
        let [conservative, balanced, aggressive] = runs;
        let conservative = conservative.recommendation;
        let balanced = self.at_least(balanced, &conservative);
        let aggressive = self.at_least(aggressive, &balanced);
        [conservative, balanced, aggressive]
    }

    /// Keep `run`'s choice if it matches or beats `prev` on both bid and
    /// win probability; otherwise take its best candidate that does, or
    /// adopt `prev` when none does.
    fn at_least(&self, run: StrategyRun, prev: &Recommendation) -> Recommendation {
        let chosen = run.recommendation;
        if chosen.bid >= prev.bid && chosen.win_probability >= prev.win_probability {
            return chosen;
        }

        let label = chosen.strategy;
        let replacement = run
            .result
            .candidates
            .iter()
            .filter(|c| c.mv >= prev.bid && c.win_probability >= prev.win_probability)
            .fold(None, |best: Option<&BidCandidate>, c| match best {
                Some(b) if b.utility >= c.utility => Some(b),
                _ => Some(c),
            });

        match replacement {
            Some(candidate) => {
                debug!(
                    strategy = %label,
                    searched = chosen.bid,
                    bid = candidate.mv,
                    "searched bid out of order, using next best candidate"
                );
                let game = RentalGame::new(self.config.clone());
                let confidence = self.confidence(&run.result, candidate.mv);
                self.recommendation(&game, label, &run.state, candidate, confidence, false)
            }
            None => {
                debug!(
                    strategy = %label,
                    searched = chosen.bid,
                    bid = prev.bid,
                    "no candidate keeps strategies in order, matching the previous one"
                );
                Recommendation {
                    strategy: label,
                    confidence: Confidence::Low,
                    ..prev.clone()
                }
            }
        }
    }

    fn recommendation(
        &self,
        game: &RentalGame,
        label: StrategyLabel,
        state: &GameState,
        candidate: &BidCandidate,
        confidence: Confidence,
        fallback: bool,
    ) -> Recommendation {
        let bid = candidate.mv;
        Recommendation {
            strategy: label,
            bid,
            win_probability: candidate.win_probability,
            expected_overpayment_or_savings: bid - state.fair_value,
            narrative_ratio: bid / state.listing_price * 100.0,
            confidence,
            expected_utility: candidate.utility,
            fair_value: state.fair_value,
            likely_response: game.likely_response(state, bid),
            round: state.round,
            fallback,
        }
    }

    fn confidence(&self, result: &SearchResult<f64>, bid: f64) -> Confidence {
        Confidence::from_dominance(result.dominance_of(&bid), result.candidates.len(), &self.config)
    }

    /// Least aggressive feasible bid, capped at the budget ceiling.
    fn fallback_bid(&self, state: &GameState) -> f64 {
        let floor = match state.round {
            Round::First => self.config.min_bid_ratio * state.listing_price,
            Round::Second => state.previous_bid.unwrap_or(state.listing_price),
        };
        floor.min(state.budget_ceiling(&self.config))
    }
}
