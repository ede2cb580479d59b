//! Game trait definition for the expectiminimax solver.
//!
//! A game exposes three kinds of positions: a MAX position where the searching
//! player picks a move, a CHANCE position resolved by nature, and a MIN
//! position resolved by an adversary. CHANCE and MIN positions are both
//! described as probability-weighted branches; the adversary is modelled by
//! a response distribution rather than a worst-case choice.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Value of a resolved branch, seen from the MAX player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Scalar utility.
    pub utility: f64,
    /// Probability that the MAX player ultimately wins along this branch.
    pub win_probability: f64,
}

impl Outcome {
    /// A branch the MAX player wins with the given utility.
    pub fn win(utility: f64) -> Self {
        Self { utility, win_probability: 1.0 }
    }

    /// A branch the MAX player loses with the given utility.
    pub fn loss(utility: f64) -> Self {
        Self { utility, win_probability: 0.0 }
    }
}

/// What lies behind a branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<S> {
    /// The MAX player moves next.
    Max(S),
    /// The adversary responds next.
    Min(S),
    /// Terminal (or heuristically scored) outcome.
    Leaf(Outcome),
}

/// One probability-weighted edge out of a CHANCE or MIN position.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch<S> {
    /// Probability of taking this edge.
    pub probability: f64,
    /// Position reached.
    pub node: Node<S>,
}

impl<S> Branch<S> {
    /// Create a branch.
    pub fn new(probability: f64, node: Node<S>) -> Self {
        Self { probability, node }
    }

    /// Create a branch that ends in a leaf.
    pub fn leaf(probability: f64, outcome: Outcome) -> Self {
        Self { probability, node: Node::Leaf(outcome) }
    }
}

/// The interface the expectiminimax solver searches over.
///
/// # Example
/// ```ignore
/// struct MyGame;
///
/// impl Game for MyGame {
///     type State = MyState;
///     type Move = MyMove;
///
///     // ... implement required methods
/// }
/// ```
pub trait Game: Sync {
    /// Snapshot of the game. Transitions return new snapshots.
    type State: Clone + Debug + Send + Sync;

    /// A MAX player's choice.
    type Move: Clone + Debug + PartialEq + Send + Sync;

    /// Moves available at a MAX position, best-first.
    ///
    /// The solver evaluates them in the given order, so putting likely-good
    /// moves first makes alpha-beta cut more.
    fn candidate_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    /// Apply a move at a MAX position, producing the CHANCE position.
    fn apply_move(&self, state: &Self::State, mv: &Self::Move) -> Self::State;

    /// Nature's outcomes at a CHANCE position.
    fn chance_outcomes(&self, state: &Self::State) -> Vec<Branch<Self::State>>;

    /// The adversary's response distribution at a MIN position.
    ///
    /// `can_continue` is false when another full round would not fit under
    /// the depth ceiling; the game must then resolve every branch to a leaf.
    fn responses(&self, state: &Self::State, can_continue: bool) -> Vec<Branch<Self::State>>;

    /// Heuristic value of a MAX position reached without depth left for a round.
    fn heuristic(&self, state: &Self::State) -> Outcome;

    /// Lower and upper bound of every utility the game can produce.
    ///
    /// Used for Star1 windows at expectation nodes; bounds that are too
    /// narrow make pruning unsound.
    fn utility_bounds(&self) -> (f64, f64);

    /// Get a human-readable name for a move.
    fn move_name(&self, mv: &Self::Move) -> String {
        format!("{:?}", mv)
    }
}
