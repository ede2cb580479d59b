//! Expectiminimax Search Module.
//!
//! A generic depth-limited expectiminimax engine for games with a searching
//! player, nature, and a probabilistic adversary.
//!
//! # Overview
//!
//! One round of play is three plies:
//! 1. **MAX**: the searching player picks a move from a short candidate list
//! 2. **CHANCE**: nature resolves, some outcomes ending the game outright
//! 3. **MIN**: the adversary responds according to a distribution
//!
//! A response may hand control back to a MAX node for another round when the
//! depth ceiling leaves room for it; otherwise the game scores it directly.
//!
//! # Pruning
//!
//! - **Probability threshold**: expectation branches below a fixed probability
//!   are skipped and their mass is not redistributed.
//! - **Alpha-beta**: MAX nodes carry the usual bounds; expectation nodes use
//!   Star1 windows derived from the game's utility bounds.
//!
//! Threshold pruning runs first, then alpha-beta works on what is left, so
//! alpha-beta never changes the result of the thresholded tree.
//!
//! # Example
//!
//! ```ignore
//! use rental_bid_solver::search::{ExpectiminimaxSolver, Game, SearchConfig};
//!
//! struct MyGame { /* ... */ }
//! impl Game for MyGame { /* ... */ }
//!
//! let mut solver = ExpectiminimaxSolver::new(MyGame::new(), SearchConfig::default());
//! let result = solver.solve(&root);
//! println!("best {:?}, {} nodes", result.best, result.stats.nodes());
//! ```
//!
//! # References
//!
//! - Michie, D. "Game-playing and game-learning automata" (1966)
//! - Ballard, B. "The *-minimax search procedure for trees containing chance nodes" (1983)

pub mod config;
pub mod game;
pub mod solver;

// Re-export main types for convenient access
pub use config::{ConfigError, SearchConfig, SearchStats, PLIES_PER_ROUND};
pub use game::{Branch, Game, Node, Outcome};
pub use solver::{Candidate, ExpectiminimaxSolver, SearchResult};
