//! Engine constants and error types for the bid advisor.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::search::{ConfigError, SearchConfig};

use super::market::MarketError;
use super::state::LandlordFeedback;

/// Every tunable constant of the bid advisor.
///
/// Passed to [`StrategyGenerator::new`](super::StrategyGenerator::new) and
/// threaded to each model from there.
///
/// # Example
/// ```
/// use rental_bid_solver::rental::BidConfig;
///
/// let config = BidConfig::default().with_budget_flexibility(0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidConfig {
    // === Payoff ===
    /// Weight on the property desirability score of a win.
    pub property_value_weight: f64,
    /// Weight on the relative overpayment of a win.
    pub overpayment_weight: f64,
    /// Multiplier turning relative overpayment into utility units.
    pub overpayment_scale: f64,
    /// Overpayment penalty discount per risk-tolerance step above 3.
    pub risk_discount: f64,
    /// Loss penalty as a fraction of the weighted property score.
    pub loss_penalty: f64,

    // === Budget and ladder ===
    /// Fraction the recommended bid may exceed the stated budget.
    pub budget_flexibility: f64,
    /// Number of candidate bids per ladder.
    pub ladder_size: usize,
    /// Lowest round-one bid as a fraction of the listing price.
    pub min_bid_ratio: f64,
    /// Highest round-one bid as a fraction of the listing price.
    pub max_bid_ratio: f64,

    // === Competitors ===
    /// Competing bidders for competition level 1, 2 and 3.
    pub competitors_per_level: [u32; 3],
    /// Relative widening of the competitor dispersion per competition level.
    pub dispersion_step: f64,
    /// A lead within this fraction of the bid counts as narrow.
    pub narrow_lead_margin: f64,

    // === Landlord ===
    /// Logistic width of the acceptance curve around the threshold.
    pub acceptance_width: f64,
    /// How far below the acceptance threshold outright rejection starts.
    pub rejection_gap: f64,
    /// Ratio span over which rejection ramps from zero to full.
    pub rejection_ramp: f64,
    /// Share of negotiation mass that becomes a best-and-final request on close bids.
    pub final_request_bias: f64,

    // === Negotiation ===
    /// Win probability assumed for negotiation cut off by the depth ceiling.
    pub negotiation_win_share: f64,
    /// Days that pass between rounds.
    pub days_between_rounds: u32,

    // === Reporting ===
    /// Dominance margin for a high-confidence label.
    pub high_confidence_margin: f64,
    /// Dominance margin for a medium-confidence label.
    pub medium_confidence_margin: f64,

    /// Run the three strategy searches on the rayon pool.
    pub parallel: bool,

    /// Search depth and pruning.
    pub search: SearchConfig,
}

impl Default for BidConfig {
    fn default() -> Self {
        Self {
            property_value_weight: 1.0,
            overpayment_weight: 0.6,
            overpayment_scale: 10.0,
            risk_discount: 0.05,
            loss_penalty: 0.5,
            budget_flexibility: 0.10,
            ladder_size: 7,
            min_bid_ratio: 0.85,
            max_bid_ratio: 1.30,
            competitors_per_level: [0, 1, 2],
            dispersion_step: 0.15,
            narrow_lead_margin: 0.03,
            acceptance_width: 0.02,
            rejection_gap: 0.10,
            rejection_ramp: 0.05,
            final_request_bias: 0.6,
            negotiation_win_share: 0.5,
            days_between_rounds: 3,
            high_confidence_margin: 0.05,
            medium_confidence_margin: 0.02,
            parallel: true,
            search: SearchConfig::default(),
        }
    }
}

impl BidConfig {
    /// Create a new BidConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the budget flexibility.
    pub fn with_budget_flexibility(mut self, flexibility: f64) -> Self {
        self.budget_flexibility = flexibility;
        self
    }

    /// Builder method: set the ladder size.
    pub fn with_ladder_size(mut self, size: usize) -> Self {
        self.ladder_size = size;
        self
    }

    /// Builder method: set whether strategies run in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder method: replace the search configuration.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BidError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| BidError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, BidError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BidError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Competing bidders at a competition level, clamped to 1..=3.
    pub fn competitors_at(&self, competitive_level: u8) -> u32 {
        let index = usize::from(competitive_level.clamp(1, 3)) - 1;
        self.competitors_per_level[index]
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), BidError> {
        self.search.validate()?;

        let non_negative = [
            ("property_value_weight", self.property_value_weight),
            ("overpayment_weight", self.overpayment_weight),
            ("overpayment_scale", self.overpayment_scale),
            ("risk_discount", self.risk_discount),
            ("loss_penalty", self.loss_penalty),
            ("budget_flexibility", self.budget_flexibility),
            ("dispersion_step", self.dispersion_step),
            ("narrow_lead_margin", self.narrow_lead_margin),
            ("rejection_gap", self.rejection_gap),
            ("medium_confidence_margin", self.medium_confidence_margin),
        ];
        for (name, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(BidError::InvalidConfig(format!("{} must be >= 0, got {}", name, value)));
            }
        }

        let positive = [
            ("acceptance_width", self.acceptance_width),
            ("rejection_ramp", self.rejection_ramp),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(BidError::InvalidConfig(format!("{} must be > 0, got {}", name, value)));
            }
        }

        let shares = [
            ("final_request_bias", self.final_request_bias),
            ("negotiation_win_share", self.negotiation_win_share),
        ];
        for (name, value) in shares {
            if !(0.0..=1.0).contains(&value) {
                return Err(BidError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.ladder_size < 2 {
            return Err(BidError::InvalidConfig(format!(
                "ladder_size must be at least 2, got {}",
                self.ladder_size
            )));
        }

        if !(self.min_bid_ratio > 0.0 && self.min_bid_ratio < self.max_bid_ratio) {
            return Err(BidError::InvalidConfig(format!(
                "bid ratios must satisfy 0 < min < max, got {} and {}",
                self.min_bid_ratio, self.max_bid_ratio
            )));
        }

        if self.narrow_lead_margin >= 1.0 {
            return Err(BidError::InvalidConfig(format!(
                "narrow_lead_margin must be below 1, got {}",
                self.narrow_lead_margin
            )));
        }

        if self.high_confidence_margin < self.medium_confidence_margin {
            return Err(BidError::InvalidConfig(format!(
                "high_confidence_margin {} is below medium_confidence_margin {}",
                self.high_confidence_margin, self.medium_confidence_margin
            )));
        }

        Ok(())
    }
}

/// Errors reported by the bid advisor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BidError {
    /// Invalid search configuration.
    #[error(transparent)]
    Search(#[from] ConfigError),
    /// Invalid or unknown market.
    #[error(transparent)]
    Market(#[from] MarketError),
    /// Invalid engine constant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Situation field out of range.
    #[error("invalid situation: {0}")]
    InvalidSituation(String),
    /// A second round only follows a counter or a best-and-final request.
    #[error("no further round after landlord feedback {0:?}")]
    NoFurtherRound(LandlordFeedback),
    /// File could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),
    /// JSON could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}
