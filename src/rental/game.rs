//! The rental bidding game as seen by the expectiminimax solver.
//!
//! ```text
//! Bidding ──bid──▶ Competing ──clear/narrow lead──▶ Responding ──accept──▶ win
//!    ▲                 │                                │ ─reject──▶ loss
//!    │                 └──outbid──▶ loss                │
//!    └────────── counter / request final (round 2) ─────┘
//! ```

use crate::search::{Branch, Candidate, Game, Node, Outcome};

use super::config::BidConfig;
use super::distribution::{BidDistributionModel, CompetitorOutcome};
use super::landlord::{LandlordAction, LandlordModel};
use super::payoff::{PayoffEvaluator, UTILITY_BOUND};
use super::state::{GameState, LandlordFeedback};

/// A bid amount with its searched value.
pub type BidCandidate = Candidate<f64>;

/// Where play stands within one round.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// The bidder picks a bid.
    Bidding(GameState),
    /// The bid is in; competitors' bids are unknown.
    Competing {
        /// State the bid was made in.
        state: GameState,
        /// Bid amount.
        bid: f64,
    },
    /// The bidder leads the competition; the landlord decides.
    Responding {
        /// State the bid was made in.
        state: GameState,
        /// Bid amount.
        bid: f64,
        /// How far ahead the bidder is.
        lead: CompetitorOutcome,
    },
}

impl Position {
    /// Underlying game state.
    pub fn state(&self) -> &GameState {
        match self {
            Position::Bidding(state) => state,
            Position::Competing { state, .. } => state,
            Position::Responding { state, .. } => state,
        }
    }
}

/// Combines the competitor, landlord and payoff models into a searchable game.
#[derive(Debug, Clone)]
pub struct RentalGame {
    config: BidConfig,
    distribution: BidDistributionModel,
    landlord: LandlordModel,
    payoff: PayoffEvaluator,
}

impl RentalGame {
    /// Create the game from one configuration shared by all models.
    pub fn new(config: BidConfig) -> Self {
        Self {
            distribution: BidDistributionModel::new(config.clone()),
            landlord: LandlordModel::new(config.clone()),
            payoff: PayoffEvaluator::new(config.clone()),
            config,
        }
    }

    /// The competitor model.
    pub fn distribution(&self) -> &BidDistributionModel {
        &self.distribution
    }

    /// The landlord model.
    pub fn landlord(&self) -> &LandlordModel {
        &self.landlord
    }

    /// The payoff evaluator.
    pub fn payoff(&self) -> &PayoffEvaluator {
        &self.payoff
    }

    /// Competitor outcome masses for `bid` in `state`.
    pub fn competitor_outcomes(&self, state: &GameState, bid: f64) -> [(CompetitorOutcome, f64); 3] {
        let ceiling = self
            .distribution
            .competitor_ceiling_distribution(state.competitive_level, &state.market_params);
        self.distribution.outcome_buckets(&ceiling, bid / state.listing_price)
    }

    /// Landlord action most likely to follow `bid`, given the more likely lead.
    pub fn likely_response(&self, state: &GameState, bid: f64) -> LandlordAction {
        let [(_, clear), (_, narrow), _] = self.competitor_outcomes(state, bid);
        let lead = if narrow > clear {
            CompetitorOutcome::NarrowLead
        } else {
            CompetitorOutcome::ClearLead
        };
        self.landlord.action_distribution(state, bid, lead).most_likely()
    }

    fn negotiation(
        &self,
        state: &GameState,
        bid: f64,
        feedback: LandlordFeedback,
        can_continue: bool,
    ) -> Node<Position> {
        let next = if can_continue {
            state.advance(bid, feedback, &self.config)
        } else {
            None
        };
        match next {
            Some(next) => Node::Max(Position::Bidding(next)),
            None => Node::Leaf(self.payoff.negotiation_leaf(state, bid)),
        }
    }
}

impl Game for RentalGame {
    type State = Position;
    type Move = f64;

    fn candidate_moves(&self, position: &Position) -> Vec<f64> {
        match position {
            Position::Bidding(state) => self.distribution.candidate_bids(state),
            _ => Vec::new(),
        }
    }

    fn apply_move(&self, position: &Position, bid: &f64) -> Position {
        Position::Competing {
            state: position.state().clone(),
            bid: *bid,
        }
    }

    fn chance_outcomes(&self, position: &Position) -> Vec<Branch<Position>> {
        let Position::Competing { state, bid } = position else {
            return Vec::new();
        };

        self.competitor_outcomes(state, *bid)
            .into_iter()
            .map(|(outcome, p)| match outcome {
                CompetitorOutcome::Outbid => {
                    Branch::leaf(p, Outcome::loss(self.payoff.loss_utility(state)))
                }
                lead => Branch::new(
                    p,
                    Node::Min(Position::Responding {
                        state: state.clone(),
                        bid: *bid,
                        lead,
                    }),
                ),
            })
            .collect()
    }

    fn responses(&self, position: &Position, can_continue: bool) -> Vec<Branch<Position>> {
        let Position::Responding { state, bid, lead } = position else {
            return Vec::new();
        };
        let bid = *bid;

        self.landlord
            .action_distribution(state, bid, *lead)
            .iter()
            .map(|(action, p)| {
                let node = match action {
                    LandlordAction::Accept => {
                        Node::Leaf(Outcome::win(self.payoff.win_utility(state, bid)))
                    }
                    LandlordAction::Reject => {
                        Node::Leaf(Outcome::loss(self.payoff.loss_utility(state)))
                    }
                    LandlordAction::Counter => self.negotiation(
                        state,
                        bid,
                        LandlordFeedback::Counter { price: state.listing_price },
                        can_continue,
                    ),
                    LandlordAction::RequestFinal => {
                        self.negotiation(state, bid, LandlordFeedback::Final, can_continue)
                    }
                };
                Branch::new(p, node)
            })
            .collect()
    }

    fn heuristic(&self, position: &Position) -> Outcome {
        let state = position.state();
        let bid = state.previous_bid.unwrap_or(state.listing_price);
        self.payoff.negotiation_leaf(state, bid)
    }

    fn utility_bounds(&self) -> (f64, f64) {
        (-UTILITY_BOUND, UTILITY_BOUND)
    }

    fn move_name(&self, bid: &f64) -> String {
        format!("${:.2}", bid)
    }
}
