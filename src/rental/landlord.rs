//! Landlord response model.
//!
//! The landlord accepts along a logistic curve in `bid / asking` centred on an
//! acceptance threshold. The threshold starts from the market condition and
//! drops with desperation (time on market) and landlord flexibility. Mass not
//! accepted goes to negotiation (counter or best-and-final request) unless the
//! bid is far below the threshold and the landlord is not desperate, in which
//! case part of it becomes an outright rejection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::BidConfig;
use super::distribution::CompetitorOutcome;
use super::state::{GameState, Round};

/// Threshold never drops below this bid-to-asking ratio.
const THRESHOLD_FLOOR: f64 = 0.90;
/// Threshold reduction at full desperation.
const DESPERATION_RELIEF: f64 = 0.1;
/// Threshold change per flexibility step away from moderate.
const FLEXIBILITY_STEP: f64 = 0.05;

/// Something the landlord can do with a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandlordAction {
    /// Take the bid.
    Accept,
    /// Name a different price.
    Counter,
    /// Ask every bidder for a best-and-final offer.
    RequestFinal,
    /// Turn the bid down.
    Reject,
}

impl LandlordAction {
    /// All actions in tie-breaking order.
    pub const ALL: [LandlordAction; 4] = [
        LandlordAction::Accept,
        LandlordAction::Counter,
        LandlordAction::RequestFinal,
        LandlordAction::Reject,
    ];

    /// Whether the action keeps negotiation going.
    pub fn continues(self) -> bool {
        matches!(self, LandlordAction::Counter | LandlordAction::RequestFinal)
    }

    /// Short description for reports.
    pub fn message(self) -> &'static str {
        match self {
            LandlordAction::Accept => "Likely to accept",
            LandlordAction::Counter => "Likely to counter-offer",
            LandlordAction::RequestFinal => "Likely to ask for best and final offers",
            LandlordAction::Reject => "Likely to reject",
        }
    }
}

impl fmt::Display for LandlordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LandlordAction::Accept => "accept",
            LandlordAction::Counter => "counter",
            LandlordAction::RequestFinal => "request final",
            LandlordAction::Reject => "reject",
        };
        write!(f, "{}", name)
    }
}

/// Probabilities of the four landlord actions. Sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionDistribution {
    /// P(accept).
    pub accept: f64,
    /// P(counter).
    pub counter: f64,
    /// P(request final).
    pub request_final: f64,
    /// P(reject).
    pub reject: f64,
}

impl ActionDistribution {
    /// Probability of one action.
    pub fn probability(&self, action: LandlordAction) -> f64 {
        match action {
            LandlordAction::Accept => self.accept,
            LandlordAction::Counter => self.counter,
            LandlordAction::RequestFinal => self.request_final,
            LandlordAction::Reject => self.reject,
        }
    }

    /// `(action, probability)` pairs in [`LandlordAction::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (LandlordAction, f64)> + '_ {
        LandlordAction::ALL.into_iter().map(move |a| (a, self.probability(a)))
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.accept + self.counter + self.request_final + self.reject
    }

    /// Most probable action; ties go to the earlier action in `ALL`.
    pub fn most_likely(&self) -> LandlordAction {
        let mut best = LandlordAction::Accept;
        for (action, p) in self.iter() {
            if p > self.probability(best) {
                best = action;
            }
        }
        best
    }
}

/// Maps a bid and the situation to landlord action probabilities.
///
/// A pure function of its inputs.
#[derive(Debug, Clone)]
pub struct LandlordModel {
    config: BidConfig,
}

impl LandlordModel {
    /// Create the model.
    pub fn new(config: BidConfig) -> Self {
        Self { config }
    }

    /// How eager the landlord is to close, in `[0.1, 0.95)`.
    ///
    /// About 0.1 on day zero, past 0.8 after a month.
    pub fn desperation(days_on_market: u32) -> f64 {
        0.1 + 0.85 * (1.0 - (-f64::from(days_on_market) / 10.0).exp())
    }

    /// Bid-to-asking ratio at which acceptance is a coin flip.
    pub fn acceptance_threshold(&self, state: &GameState) -> f64 {
        let base = state.market_params.condition().base_acceptance_ratio();
        let d = Self::desperation(state.days_on_market);
        let flexibility = f64::from(state.price_sens_landlord) - 2.0;
        (base * (1.0 - DESPERATION_RELIEF * d) * (1.0 - FLEXIBILITY_STEP * flexibility))
            .max(THRESHOLD_FLOOR)
    }

    /// Action probabilities for `bid`, given how close the competition was.
    pub fn action_distribution(
        &self,
        state: &GameState,
        bid: f64,
        lead: CompetitorOutcome,
    ) -> ActionDistribution {
        let q = bid / state.asking_price();
        let d = Self::desperation(state.days_on_market);
        let threshold = self.acceptance_threshold(state);

        let accept = 1.0 / (1.0 + (-(q - threshold) / self.config.acceptance_width).exp());
        let rest = 1.0 - accept;

        let reject_threshold = threshold - self.config.rejection_gap;
        let mut reject_share = if q < reject_threshold {
            ((reject_threshold - q) / self.config.rejection_ramp).clamp(0.0, 1.0) * (1.0 - d)
        } else {
            0.0
        };
        if state.round == Round::Second {
            // A second refusal is final more often.
            reject_share = reject_share.max((1.0 - d) / 2.0);
        }

        let reject = rest * reject_share;
        let negotiate = rest - reject;

        let final_bias = if lead == CompetitorOutcome::NarrowLead || q >= 1.0 {
            self.config.final_request_bias
        } else {
            1.0 - self.config.final_request_bias
        };

        ActionDistribution {
            accept,
            counter: negotiate * (1.0 - final_bias),
            request_final: negotiate * final_bias,
            reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::market::MarketParams;
    use crate::rental::state::LandlordFeedback;
    use crate::rental::test_support::{cooling_market, scenario};

    fn setup() -> (LandlordModel, GameState, BidConfig) {
        let config = BidConfig::default();
        let state = GameState::from_situation(&scenario(), &cooling_market(), &config);
        (LandlordModel::new(config.clone()), state, config)
    }

    #[test]
    fn test_desperation_saturates() {
        assert!((LandlordModel::desperation(0) - 0.1).abs() < 1e-12);
        assert!(LandlordModel::desperation(30) > 0.9);
        assert!(LandlordModel::desperation(365) <= 0.95);
        let mut last = 0.0;
        for days in 0..60 {
            let d = LandlordModel::desperation(days);
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let (model, state, _) = setup();
        for ratio in [0.5, 0.8, 0.9, 0.95, 1.0, 1.05, 1.3] {
            for lead in [CompetitorOutcome::ClearLead, CompetitorOutcome::NarrowLead] {
                let dist = model.action_distribution(&state, ratio * 2200.0, lead);
                assert!((dist.total() - 1.0).abs() < 1e-12);
                assert!(dist.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
            }
        }
    }

    #[test]
    fn test_acceptance_rises_with_bid_and_desperation() {
        let (model, state, _) = setup();
        let lead = CompetitorOutcome::ClearLead;
        let low = model.action_distribution(&state, 2000.0, lead);
        let high = model.action_distribution(&state, 2250.0, lead);
        assert!(high.accept > low.accept);

        let stale = GameState { days_on_market: 45, ..state.clone() };
        assert!(model.action_distribution(&stale, 2100.0, lead).accept
            > model.action_distribution(&state, 2100.0, lead).accept);
    }

    #[test]
    fn test_firm_landlord_needs_higher_ratio() {
        let (model, state, _) = setup();
        let firm = GameState { price_sens_landlord: 1, ..state.clone() };
        let flexible = GameState { price_sens_landlord: 3, ..state.clone() };
        assert!(model.acceptance_threshold(&firm) > model.acceptance_threshold(&state));
        assert!(model.acceptance_threshold(&flexible) < model.acceptance_threshold(&state));

        let lead = CompetitorOutcome::ClearLead;
        assert!(model.action_distribution(&firm, 2150.0, lead).accept
            < model.action_distribution(&flexible, 2150.0, lead).accept);
    }

    #[test]
    fn test_hot_market_raises_threshold() {
        let (model, state, _) = setup();
        let hot = GameState { market_params: MarketParams::new(1.08, 0.12, 0.3), ..state.clone() };
        assert!(model.acceptance_threshold(&hot) > model.acceptance_threshold(&state));
    }

    #[test]
    fn test_round_one_low_bid_negotiates_rather_than_rejects() {
        let (model, state, _) = setup();
        // Just below threshold: no rejection at all in round one.
        let dist = model.action_distribution(&state, 2050.0, CompetitorOutcome::ClearLead);
        assert_eq!(dist.reject, 0.0);
        assert!(dist.counter > dist.request_final);

        // Far below market on a fresh listing: rejection dominates.
        let fresh = GameState { days_on_market: 0, ..state.clone() };
        let lowball = model.action_distribution(&fresh, 1540.0, CompetitorOutcome::ClearLead);
        assert!(lowball.reject > 0.5, "reject {}", lowball.reject);
        assert_eq!(lowball.most_likely(), LandlordAction::Reject);
    }

    #[test]
    fn test_narrow_lead_favours_final_request() {
        let (model, state, _) = setup();
        let clear = model.action_distribution(&state, 2100.0, CompetitorOutcome::ClearLead);
        let narrow = model.action_distribution(&state, 2100.0, CompetitorOutcome::NarrowLead);
        assert!(narrow.request_final > clear.request_final);
        assert_eq!(narrow.accept, clear.accept);
    }

    #[test]
    fn test_second_round_rejects_more() {
        let (model, state, config) = setup();
        let second = state.advance(2100.0, LandlordFeedback::Final, &config).unwrap();
        let lead = CompetitorOutcome::ClearLead;
        let first = model.action_distribution(&state, 2100.0, lead);
        let later = model.action_distribution(&second, 2100.0, lead);
        assert!(later.reject > first.reject);
    }

    #[test]
    fn test_counter_price_is_the_new_asking() {
        let (model, state, config) = setup();
        let countered = state
            .advance(2100.0, LandlordFeedback::Counter { price: 2150.0 }, &config)
            .unwrap();
        let dist = model.action_distribution(&countered, 2150.0, CompetitorOutcome::ClearLead);
        // Meeting the counter price exactly is well above the threshold.
        assert!(dist.accept > 0.9, "accept {}", dist.accept);
    }
}
