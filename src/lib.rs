//! # Rental Bid Solver
//!
//! Recommends a monthly bid for a contested rental unit by searching a small
//! probabilistic game between the bidder, the competing bidders and the
//! landlord.
//!
//! ## Features
//!
//! - **Generic expectiminimax engine**: works with any game implementing the
//!   `search::Game` trait
//! - **Pruning**: probability-threshold pruning plus Star1 alpha-beta at
//!   expectation nodes
//! - **Order-statistic competitor model**: the highest of N log-normal
//!   competing bids, with an optional skewed mixture
//! - **Three strategies**: conservative, balanced and aggressive, searched in
//!   parallel
//!
//! ## Quick Start
//!
//! ```ignore
//! use rental_bid_solver::rental::{BidConfig, MarketTable, StrategyGenerator};
//!
//! let market = MarketTable::builtin().get("downtown")?;
//! let generator = StrategyGenerator::new(BidConfig::default())?;
//! let [conservative, balanced, aggressive] =
//!     generator.generate_three_strategies(&situation, &market)?;
//! ```
//!
//! ## Modules
//!
//! - [`search`]: generic expectiminimax search
//! - [`rental`]: the rental bidding game and recommendation generator
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   StrategyGenerator (rayon)                     │
//! │   conservative        │        balanced        │   aggressive   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ one search per strategy
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Expectiminimax Solver (generic)                    │
//! │  - MAX / CHANCE / MIN       - Threshold + alpha-beta pruning    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ RentalGame implements Game
//!                               ▼
//!         ┌─────────────────────┼─────────────────────┐
//!         │                     │                     │
//!         ▼                     ▼                     ▼
//!   ┌────────────┐       ┌────────────┐        ┌────────────┐
//!   │ Competitor │       │  Landlord  │        │   Payoff   │
//!   │   model    │       │   model    │        │ evaluator  │
//!   └────────────┘       └────────────┘        └────────────┘
//! ```

#![warn(missing_docs)]

/// Expectiminimax search module.
///
/// The generic engine; knows nothing about rentals.
pub mod search;

/// Rental bidding module.
///
/// Market data, the competitor and landlord models, payoffs and the
/// strategy generator.
pub mod rental;

// Re-export commonly used types at crate root for convenience
pub use rental::{
    BidConfig, BidError, LandlordFeedback, MarketParams, MarketTable, Recommendation, Situation,
    StrategyGenerator, StrategyLabel,
};
pub use search::{ExpectiminimaxSolver, Game, SearchConfig, SearchStats};
