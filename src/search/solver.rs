//! Depth-limited expectiminimax with alpha-beta and probability pruning.
//!
//! The search alternates three node kinds:
//! - **MAX**: the searching player picks the move with the highest value
//! - **CHANCE**: nature's outcomes, valued as a probability-weighted sum
//! - **MIN**: the adversary's response distribution, also an expectation
//!
//! Expectation nodes use Star1 windows: after each child the running sum and
//! the game's utility bounds give a bracket on the node value, and the node
//! fails hard as soon as that bracket leaves the `(alpha, beta)` window.
//! Branches below the probability threshold are removed before any of this
//! happens and their mass is not redistributed.

use tracing::trace;

use crate::search::config::{SearchConfig, SearchStats, PLIES_PER_ROUND};
use crate::search::game::{Branch, Game, Node, Outcome};

/// A root move together with its exact value.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<M> {
    /// The move.
    pub mv: M,
    /// Expected utility.
    pub utility: f64,
    /// Aggregate probability of ending in a win.
    pub win_probability: f64,
}

/// Result of a root search.
#[derive(Debug, Clone)]
pub struct SearchResult<M> {
    /// Highest-valued candidate, `None` when the root had no moves.
    pub best: Option<Candidate<M>>,
    /// Every root candidate in the order it was searched.
    pub candidates: Vec<Candidate<M>>,
    /// Node and pruning counters.
    pub stats: SearchStats,
}

impl<M: PartialEq> SearchResult<M> {
    /// Margin of the best candidate over the mean of the others.
    ///
    /// Zero when there is at most one candidate.
    pub fn dominance(&self) -> f64 {
        match &self.best {
            Some(best) => self.dominance_of(&best.mv),
            None => 0.0,
        }
    }

    /// Margin of the candidate for `mv` over the mean of the others.
    ///
    /// Zero when `mv` was not searched or is the only candidate.
    pub fn dominance_of(&self, mv: &M) -> f64 {
        let Some(chosen) = self.candidates.iter().find(|c| &c.mv == mv) else {
            return 0.0;
        };
        let others: Vec<f64> = self
            .candidates
            .iter()
            .filter(|c| &c.mv != mv)
            .map(|c| c.utility)
            .collect();
        if others.is_empty() {
            return 0.0;
        }
        chosen.utility - others.iter().sum::<f64>() / others.len() as f64
    }
}

/// The expectiminimax solver.
///
/// Generic over any game implementing [`Game`]. The solver owns its game and
/// configuration and accumulates statistics across calls until
/// [`reset_stats`](Self::reset_stats) is called.
///
/// # Example
/// ```ignore
/// use rental_bid_solver::search::{ExpectiminimaxSolver, SearchConfig};
///
/// let mut solver = ExpectiminimaxSolver::new(game, SearchConfig::default());
/// let result = solver.solve(&root);
/// let best = result.best.expect("root has moves");
/// ```
pub struct ExpectiminimaxSolver<G: Game> {
    game: G,
    config: SearchConfig,
    stats: SearchStats,
}

impl<G: Game> ExpectiminimaxSolver<G> {
    /// Create a new solver for the given game.
    pub fn new(game: G, config: SearchConfig) -> Self {
        Self {
            game,
            config,
            stats: SearchStats::new(),
        }
    }

    /// The game being searched.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// The solver configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Clear accumulated statistics.
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::new();
    }

    /// Search from a MAX position and value every root move.
    ///
    /// Root moves are scored with an unbounded window so each candidate's
    /// value is exact; pruning only applies below the root. Ties keep the
    /// earlier move.
    pub fn solve(&mut self, root: &G::State) -> SearchResult<G::Move> {
        let mut total = std::mem::take(&mut self.stats);
        self.stats.max_nodes += 1;

        let mut candidates = Vec::new();
        let mut best: Option<Candidate<G::Move>> = None;

        for mv in self.game.candidate_moves(root) {
            let outcome = self.evaluate_move(root, &mv);
            trace!(
                mv = %self.game.move_name(&mv),
                utility = outcome.utility,
                win_probability = outcome.win_probability,
                "root candidate"
            );
            let candidate = Candidate {
                mv,
                utility: outcome.utility,
                win_probability: outcome.win_probability,
            };
            if best.as_ref().map_or(true, |b| candidate.utility > b.utility) {
                best = Some(candidate.clone());
            }
            candidates.push(candidate);
        }

        let stats = self.stats.clone();
        total.merge(&stats);
        self.stats = total;

        SearchResult {
            best,
            candidates,
            stats,
        }
    }

    /// Exact value of playing `mv` at the MAX position `root`.
    pub fn evaluate_move(&mut self, root: &G::State, mv: &G::Move) -> Outcome {
        let next = self.game.apply_move(root, mv);
        self.chance_node(
            &next,
            self.config.max_depth.saturating_sub(1),
            f64::NEG_INFINITY,
            f64::INFINITY,
        )
    }

    fn node(&mut self, node: Node<G::State>, depth: usize, alpha: f64, beta: f64) -> Outcome {
        match node {
            Node::Max(state) => self.max_node(&state, depth, alpha, beta),
            Node::Min(state) => self.min_node(&state, depth, alpha, beta),
            Node::Leaf(outcome) => {
                self.stats.leaves += 1;
                outcome
            }
        }
    }

    fn max_node(&mut self, state: &G::State, depth: usize, alpha: f64, beta: f64) -> Outcome {
        if depth < PLIES_PER_ROUND {
            self.stats.leaves += 1;
            return self.game.heuristic(state);
        }
        self.stats.max_nodes += 1;

        let (lo, _) = self.game.utility_bounds();
        let mut alpha = alpha;
        let mut best: Option<Outcome> = None;

        for mv in self.game.candidate_moves(state) {
            let next = self.game.apply_move(state, &mv);
            let outcome = self.chance_node(&next, depth - 1, alpha, beta);

            if best.map_or(true, |b| outcome.utility > b.utility) {
                best = Some(outcome);
            }

            if self.config.use_alpha_beta {
                alpha = alpha.max(outcome.utility);
                if alpha >= beta {
                    self.stats.cutoffs += 1;
                    break;
                }
            }
        }

        best.unwrap_or(Outcome::loss(lo))
    }

    fn chance_node(&mut self, state: &G::State, depth: usize, alpha: f64, beta: f64) -> Outcome {
        self.stats.chance_nodes += 1;
        let branches = self.game.chance_outcomes(state);
        self.expectation(branches, depth.saturating_sub(1), alpha, beta)
    }

    fn min_node(&mut self, state: &G::State, depth: usize, alpha: f64, beta: f64) -> Outcome {
        self.stats.min_nodes += 1;
        let can_continue = depth.saturating_sub(1) >= PLIES_PER_ROUND;
        let branches = self.game.responses(state, can_continue);
        self.expectation(branches, depth.saturating_sub(1), alpha, beta)
    }

    /// Probability-weighted value of `branches`, each searched at `depth`.
    fn expectation(
        &mut self,
        branches: Vec<Branch<G::State>>,
        depth: usize,
        alpha: f64,
        beta: f64,
    ) -> Outcome {
        let threshold = self.config.effective_threshold();
        let (lo, hi) = self.game.utility_bounds();

        let mut kept = Vec::with_capacity(branches.len());
        for branch in branches {
            if branch.probability <= 0.0 {
                continue;
            }
            if branch.probability < threshold {
                self.stats.pruned_branches += 1;
                self.stats.pruned_mass += branch.probability;
                continue;
            }
            kept.push(branch);
        }

        let mut remaining: f64 = kept.iter().map(|b| b.probability).sum();
        let mut utility = 0.0;
        let mut win_probability = 0.0;

        for branch in kept {
            let p = branch.probability;
            remaining -= p;

            if !self.config.use_alpha_beta {
                let child = self.node(branch.node, depth, alpha, beta);
                utility += p * child.utility;
                win_probability += p * child.win_probability;
                continue;
            }

            // Star1: child value that would push the bracket outside the window.
            let child_alpha = (alpha - utility - remaining * hi) / p;
            let child_beta = (beta - utility - remaining * lo) / p;

            let child = self.node(
                branch.node,
                depth,
                child_alpha.max(lo),
                child_beta.min(hi),
            );
            win_probability += p * child.win_probability;

            if child.utility <= child_alpha {
                self.stats.cutoffs += 1;
                return Outcome { utility: alpha, win_probability };
            }
            if child.utility >= child_beta {
                self.stats.cutoffs += 1;
                return Outcome { utility: beta, win_probability };
            }

            utility += p * child.utility;
        }

        Outcome { utility, win_probability }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-round toy game with hand-checkable values.
    ///
    /// Stake 1 carries a 0.5% jackpot that the default threshold drops, and
    /// stake 2 is almost always an outright loss so later siblings get cut.
    #[derive(Clone)]
    struct TossGame {
        stakes: Vec<u8>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Toss {
        round: u8,
        stake: Option<u8>,
    }

    impl Game for TossGame {
        type State = Toss;
        type Move = u8;

        fn candidate_moves(&self, _state: &Toss) -> Vec<u8> {
            self.stakes.clone()
        }

        fn apply_move(&self, state: &Toss, mv: &u8) -> Toss {
            Toss { round: state.round, stake: Some(*mv) }
        }

        fn chance_outcomes(&self, state: &Toss) -> Vec<Branch<Toss>> {
            let next = Node::Min(state.clone());
            match state.stake.unwrap_or(0) {
                0 => vec![
                    Branch::leaf(0.5, Outcome::loss(-0.2)),
                    Branch::new(0.5, next),
                ],
                1 => vec![
                    Branch::leaf(0.3, Outcome::loss(-0.2)),
                    Branch::new(0.695, next),
                    Branch::leaf(0.005, Outcome::win(1.0)),
                ],
                _ => vec![
                    Branch::leaf(0.95, Outcome::loss(-1.0)),
                    Branch::new(0.05, next),
                ],
            }
        }

        fn responses(&self, state: &Toss, can_continue: bool) -> Vec<Branch<Toss>> {
            let stake = f64::from(state.stake.unwrap_or(0));
            let accept = 0.8 - 0.1 * stake - 0.2 * f64::from(state.round - 1);
            let counter = if can_continue && state.round == 1 {
                Node::Max(Toss { round: 2, stake: None })
            } else {
                Node::Leaf(Outcome { utility: 0.0, win_probability: 0.5 })
            };
            vec![
                Branch::leaf(0.6, Outcome::win(accept)),
                Branch::leaf(0.1, Outcome::loss(-0.5)),
                Branch::new(0.3, counter),
            ]
        }

        fn heuristic(&self, _state: &Toss) -> Outcome {
            Outcome { utility: 0.0, win_probability: 0.5 }
        }

        fn utility_bounds(&self) -> (f64, f64) {
            (-1.0, 1.0)
        }
    }

    fn toss() -> TossGame {
        TossGame { stakes: vec![0, 1, 2] }
    }

    fn root() -> Toss {
        Toss { round: 1, stake: None }
    }

    #[test]
    fn test_single_round_matches_hand_computation() {
        let config = SearchConfig::default().with_max_depth(3);
        let mut solver = ExpectiminimaxSolver::new(toss(), config);
        let result = solver.solve(&root());

        let best = result.best.clone().unwrap();
        assert_eq!(best.mv, 1);
        assert!((best.utility - 0.19715).abs() < 1e-12, "utility {}", best.utility);
        assert!((best.win_probability - 0.52125).abs() < 1e-12);

        let stake0 = &result.candidates[0];
        assert!((stake0.utility - 0.115).abs() < 1e-12);
        assert!((stake0.win_probability - 0.375).abs() < 1e-12);

        // One 0.5% jackpot branch under the stake-1 chance node.
        assert_eq!(result.stats.pruned_branches, 1);
        assert!((result.stats.pruned_mass - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_second_round_reached_with_full_depth() {
        let mut solver = ExpectiminimaxSolver::new(toss(), SearchConfig::default());
        let result = solver.solve(&root());

        let best = result.best.unwrap();
        assert_eq!(best.mv, 1);
        assert!((best.utility - 0.220866875).abs() < 1e-12, "utility {}", best.utility);
        assert!(result.stats.max_nodes > 1, "nested MAX nodes should be expanded");
    }

    #[test]
    fn test_alpha_beta_matches_full_width() {
        let pruned_config = SearchConfig::default();
        let full_config = SearchConfig::default().with_alpha_beta(false);

        let pruned = ExpectiminimaxSolver::new(toss(), pruned_config).solve(&root());
        let full = ExpectiminimaxSolver::new(toss(), full_config).solve(&root());

        println!("pruned: {:?}", pruned.stats);
        println!("full:   {:?}", full.stats);

        assert_eq!(pruned.best.as_ref().map(|c| c.mv), full.best.as_ref().map(|c| c.mv));
        for (a, b) in pruned.candidates.iter().zip(&full.candidates) {
            assert_eq!(a.mv, b.mv);
            assert!((a.utility - b.utility).abs() < 1e-12);
            assert!((a.win_probability - b.win_probability).abs() < 1e-12);
        }

        assert!(pruned.stats.cutoffs > 0, "stake 2 should be cut in nested rounds");
        assert_eq!(full.stats.cutoffs, 0);
        assert!(pruned.stats.leaves < full.stats.leaves);
    }

    #[test]
    fn test_probability_pruning_error_is_bounded() {
        let pruned = ExpectiminimaxSolver::new(toss(), SearchConfig::default()).solve(&root());
        let exact = ExpectiminimaxSolver::new(toss(), SearchConfig::exhaustive()).solve(&root());

        let pruned_best = pruned.best.unwrap();
        let exact_best = exact.best.unwrap();
        assert_eq!(pruned_best.mv, exact_best.mv);
        assert!((exact_best.utility - 0.226909375).abs() < 1e-12);

        // Each dropped branch is worth at most threshold × max|utility|.
        let diff = (exact_best.utility - pruned_best.utility).abs();
        assert!(diff <= 0.01 * 2.0, "diff {}", diff);
        assert_eq!(exact.stats.pruned_branches, 0);
    }

    #[test]
    fn test_no_moves_yields_no_best() {
        let game = TossGame { stakes: vec![] };
        let result = ExpectiminimaxSolver::new(game, SearchConfig::default()).solve(&root());
        assert!(result.best.is_none());
        assert!(result.candidates.is_empty());
        assert_eq!(result.dominance(), 0.0);
    }

    #[test]
    fn test_dominance_against_mean_of_others() {
        let config = SearchConfig::default().with_max_depth(3);
        let result = ExpectiminimaxSolver::new(toss(), config).solve(&root());
        let expected = 0.19715 - (0.115 + -0.9345) / 2.0;
        assert!((result.dominance() - expected).abs() < 1e-12);

        let runner_up = result
            .candidates
            .iter()
            .find(|c| (c.utility - 0.115).abs() < 1e-9)
            .unwrap();
        let expected = 0.115 - (0.19715 + -0.9345) / 2.0;
        assert!((result.dominance_of(&runner_up.mv) - expected).abs() < 1e-12);
        assert_eq!(result.dominance_of(&99), 0.0);
    }

    #[test]
    fn test_stats_are_per_call() {
        let mut solver = ExpectiminimaxSolver::new(toss(), SearchConfig::default());
        let first = solver.solve(&root());
        let second = solver.solve(&root());
        assert_eq!(first.stats, second.stats);
        assert_eq!(solver.stats().max_nodes, 2 * first.stats.max_nodes);
    }
}
