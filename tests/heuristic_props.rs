//! Property tests for the ordering heuristics.

use proptest::prelude::*;

use route_optimizer::heuristic::plan_order;
use route_optimizer::matrix::{CostMatrix, CostMetric};
use route_optimizer::settings::{OptimizationSettings, OptimizationType};
use route_optimizer::stop::{Priority, Stop};

fn stops(n: usize) -> Vec<Stop> {
    (0..n)
        .map(|i| Stop::new(format!("s{i}"), format!("s{i}"), "", 0.0, 0.0))
        .collect()
}

/// Random square cost matrices with zero diagonals, sizes 3..=7.
fn cost_matrices() -> impl Strategy<Value = CostMatrix> {
    (3usize..=7)
        .prop_flat_map(|size| {
            proptest::collection::vec(proptest::collection::vec(0.1f64..100.0, size), size)
                .prop_map(move |mut rows| {
                    for (i, row) in rows.iter_mut().enumerate() {
                        row[i] = 0.0;
                    }
                    CostMatrix::from_rows(rows, CostMetric::Distance).expect("square rows")
                })
        })
}

proptest! {
    /// The result is always a permutation starting at the requested stop.
    #[test]
    fn order_is_a_permutation_from_start(matrix in cost_matrices(), seed in 0usize..7) {
        let n = matrix.size();
        let start = seed % n;
        let order = plan_order(
            &stops(n),
            &matrix,
            &OptimizationSettings::new(OptimizationType::Distance),
            start,
            None,
        ).expect("plan succeeds");

        prop_assert_eq!(order.len(), n);
        prop_assert_eq!(order[0], start);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    /// Every greedy step picks a minimum-cost unvisited stop.
    #[test]
    fn each_greedy_step_is_locally_minimal(matrix in cost_matrices()) {
        let n = matrix.size();
        let order = plan_order(
            &stops(n),
            &matrix,
            &OptimizationSettings::new(OptimizationType::Distance),
            0,
            None,
        ).expect("plan succeeds");

        let mut unvisited: Vec<usize> = (1..n).collect();
        let mut current = 0;
        for &next in &order[1..] {
            let chosen = matrix.get(current, next);
            for &other in &unvisited {
                prop_assert!(chosen <= matrix.get(current, other));
            }
            unvisited.retain(|&i| i != next);
            current = next;
        }
    }

    /// Balanced ordering with all-medium priorities equals distance
    /// ordering on the same matrix.
    #[test]
    fn balanced_is_weight_neutral_for_uniform_priorities(matrix in cost_matrices()) {
        let n = matrix.size();
        let uniform = stops(n);

        let by_distance = plan_order(
            &uniform,
            &matrix,
            &OptimizationSettings::new(OptimizationType::Distance),
            0,
            None,
        ).expect("plan succeeds");
        let balanced = plan_order(
            &uniform,
            &matrix,
            &OptimizationSettings::new(OptimizationType::Balanced),
            0,
            None,
        ).expect("plan succeeds");

        prop_assert_eq!(by_distance, balanced);
    }

    /// Raising a stop's importance never raises the effective cost of
    /// reaching it.
    #[test]
    fn priority_weighting_is_monotonic(cost in 0.0f64..1e6) {
        let high = cost * Priority::High.weight();
        let medium = cost * Priority::Medium.weight();
        let low = cost * Priority::Low.weight();
        prop_assert!(high <= medium);
        prop_assert!(medium <= low);
    }

    /// A fixed end anchor is always last, for any matrix.
    #[test]
    fn end_anchor_is_always_last(matrix in cost_matrices(), seed in 0usize..7) {
        let n = matrix.size();
        let end = seed % n;
        let start = (end + 1) % n;
        let order = plan_order(
            &stops(n),
            &matrix,
            &OptimizationSettings::new(OptimizationType::Distance),
            start,
            Some(end),
        ).expect("plan succeeds");

        prop_assert_eq!(order[0], start);
        prop_assert_eq!(*order.last().expect("non-empty"), end);
    }
}
