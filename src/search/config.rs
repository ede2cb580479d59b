//! Configuration options for the expectiminimax search.
//!
//! This module provides the knobs that bound the search (depth) and the two
//! pruning rules layered on top of plain expectiminimax: probability-threshold
//! pruning at expectation nodes and alpha-beta bounds across node kinds.

use serde::{Deserialize, Serialize};

/// Plies in one full bidding round: MAX (bid) → CHANCE (competitors) → MIN (landlord).
pub const PLIES_PER_ROUND: usize = 3;

/// Configuration for the expectiminimax solver.
///
/// # Example
/// ```
/// use rental_bid_solver::search::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert!(config.use_alpha_beta);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Depth ceiling in plies.
    ///
    /// The default of 6 covers two full rounds. A MIN node only hands control
    /// back to a MAX node when at least one more full round fits under the
    /// ceiling; otherwise continuing negotiation is scored heuristically.
    pub max_depth: usize,

    /// Expectation branches whose probability is below this value are dropped.
    ///
    /// Dropped mass is not redistributed, so the value of an expectation
    /// node can be off by at most `threshold × branches × max|utility|`.
    /// Raising it trades accuracy for speed.
    pub probability_threshold: f64,

    /// Enable alpha-beta bounds (Star1 windows at expectation nodes).
    pub use_alpha_beta: bool,

    /// Enable probability-threshold pruning.
    ///
    /// Applied before alpha-beta: negligible branches are removed first and
    /// the remaining ones are searched under alpha-beta windows.
    pub use_probability_pruning: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 2 * PLIES_PER_ROUND,
            probability_threshold: 0.01,
            use_alpha_beta: true,
            use_probability_pruning: true,
        }
    }
}

impl SearchConfig {
    /// Create a new SearchConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-width search with both pruning rules disabled.
    ///
    /// Used as the reference when checking that pruning leaves the best move
    /// and its value unchanged.
    pub fn exhaustive() -> Self {
        Self {
            use_alpha_beta: false,
            use_probability_pruning: false,
            ..Default::default()
        }
    }

    /// Builder method: set the depth ceiling in plies.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method: set the probability pruning threshold.
    pub fn with_probability_threshold(mut self, threshold: f64) -> Self {
        self.probability_threshold = threshold;
        self
    }

    /// Builder method: set whether to use alpha-beta bounds.
    pub fn with_alpha_beta(mut self, enable: bool) -> Self {
        self.use_alpha_beta = enable;
        self
    }

    /// Builder method: set whether to drop low-probability branches.
    pub fn with_probability_pruning(mut self, enable: bool) -> Self {
        self.use_probability_pruning = enable;
        self
    }

    /// Probability below which an expectation branch is skipped.
    pub fn effective_threshold(&self) -> f64 {
        if self.use_probability_pruning {
            self.probability_threshold
        } else {
            0.0
        }
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth < PLIES_PER_ROUND {
            return Err(ConfigError::DepthTooShallow(self.max_depth));
        }

        if !(0.0..1.0).contains(&self.probability_threshold) {
            return Err(ConfigError::InvalidThreshold(self.probability_threshold));
        }

        Ok(())
    }
}

/// Errors that can occur when validating search configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The depth ceiling cannot hold a single MAX → CHANCE → MIN round.
    #[error("search depth {0} is below one full round ({PLIES_PER_ROUND} plies)")]
    DepthTooShallow(usize),
    /// Probability threshold is outside [0, 1).
    #[error("probability threshold {0} is out of range [0, 1)")]
    InvalidThreshold(f64),
}

/// Counters collected during one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// MAX nodes expanded.
    pub max_nodes: u64,
    /// CHANCE nodes expanded.
    pub chance_nodes: u64,
    /// MIN nodes expanded.
    pub min_nodes: u64,
    /// Leaves scored.
    pub leaves: u64,
    /// Subtrees cut by alpha-beta bounds.
    pub cutoffs: u64,
    /// Branches dropped by the probability threshold.
    pub pruned_branches: u64,
    /// Total probability mass of the dropped branches (unweighted by reach).
    pub pruned_mass: f64,
}

impl SearchStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total interior nodes expanded.
    pub fn nodes(&self) -> u64 {
        self.max_nodes + self.chance_nodes + self.min_nodes
    }

    /// Fold another run's counters into this one.
    pub fn merge(&mut self, other: &SearchStats) {
        self.max_nodes += other.max_nodes;
        self.chance_nodes += other.chance_nodes;
        self.min_nodes += other.min_nodes;
        self.leaves += other.leaves;
        self.cutoffs += other.cutoffs;
        self.pruned_branches += other.pruned_branches;
        self.pruned_mass += other.pruned_mass;
    }
}
