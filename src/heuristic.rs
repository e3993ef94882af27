//! Visitation-order construction.
//!
//! Greedy nearest-neighbor tour construction over a pairwise cost matrix,
//! with an optional priority-weighted variant and an exact branch-and-bound
//! path for small instances. Nearest-neighbor is an approximation with no
//! optimality guarantee; it can produce poor tails on adversarial layouts.
//! In the full pipeline its output only seeds the routing provider, whose
//! own optimizer refines the intermediate waypoint order.

use crate::error::RoutingError;
use crate::matrix::CostMatrix;
use crate::settings::{OptimizationSettings, OptimizationType};
use crate::stop::Stop;

/// Computes the visitation order for `stops` over `matrix`.
///
/// `start` is the fixed first index; `end`, when present and distinct from
/// `start`, is the fixed last index (an `end` equal to `start` denotes a
/// round trip and does not constrain the ordering). The returned vector is
/// a permutation of `0..matrix.size()` beginning with `start`.
///
/// Candidate edges are compared by matrix cost multiplied by the candidate
/// stop's weight (priority weights for `Balanced`, 1.0 otherwise); ties
/// break on the lowest stop index, so the order is deterministic for a given
/// input. `+infinity` edges lose against any finite edge and are taken only
/// when nothing else remains.
pub fn plan_order(
    stops: &[Stop],
    matrix: &CostMatrix,
    settings: &OptimizationSettings,
    start: usize,
    end: Option<usize>,
) -> Result<Vec<usize>, RoutingError> {
    if settings.optimization_type == OptimizationType::Custom {
        return Err(RoutingError::CustomNotSupported);
    }
    if matrix.size() != stops.len() {
        return Err(RoutingError::Parse(format!(
            "cost matrix is {}x{} but there are {} stops",
            matrix.size(),
            matrix.size(),
            stops.len()
        )));
    }

    let weights = stop_weights(stops, settings.optimization_type);
    let anchored_end = end.filter(|&e| e != start);
    let free = stops.len() - 1 - usize::from(anchored_end.is_some());

    if free > 1 && free <= settings.exact_search_limit {
        Ok(exact_order(matrix, &weights, start, anchored_end))
    } else {
        Ok(greedy_order(matrix, &weights, start, anchored_end))
    }
}

/// Per-stop edge multipliers for the given strategy.
pub(crate) fn stop_weights(stops: &[Stop], optimization_type: OptimizationType) -> Vec<f64> {
    match optimization_type {
        OptimizationType::Balanced => stops
            .iter()
            .map(|stop| stop.effective_priority().weight())
            .collect(),
        _ => vec![1.0; stops.len()],
    }
}

/// Greedy nearest-neighbor construction.
fn greedy_order(
    matrix: &CostMatrix,
    weights: &[f64],
    start: usize,
    end: Option<usize>,
) -> Vec<usize> {
    let n = matrix.size();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    visited[start] = true;
    order.push(start);
    if let Some(e) = end {
        visited[e] = true;
    }

    let mut current = start;
    let free = n - order.len() - usize::from(end.is_some());
    for _ in 0..free {
        let mut best: Option<(usize, f64)> = None;
        for candidate in 0..n {
            if visited[candidate] {
                continue;
            }
            let cost = matrix.get(current, candidate) * weights[candidate];
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((candidate, cost)),
            }
        }
        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    if let Some(e) = end {
        order.push(e);
    }
    order
}

/// Exact branch-and-bound search over the same weighted edge costs.
///
/// Enumerates permutations of the free stops depth-first, pruning branches
/// whose partial cost already meets the best complete tour. Seeded with the
/// greedy tour so pruning bites immediately. Factorial worst case; callers
/// gate it via [`OptimizationSettings::exact_search_limit`].
fn exact_order(
    matrix: &CostMatrix,
    weights: &[f64],
    start: usize,
    end: Option<usize>,
) -> Vec<usize> {
    let n = matrix.size();
    let mut best = greedy_order(matrix, weights, start, end);
    let mut best_cost = order_cost(matrix, weights, &best);

    let mut free: Vec<usize> = (0..n)
        .filter(|&i| i != start && Some(i) != end)
        .collect();
    let mut path = Vec::with_capacity(free.len());

    search(
        matrix, weights, start, end, start, 0.0, &mut free, 0, &mut path, &mut best, &mut best_cost,
    );
    best
}

#[allow(clippy::too_many_arguments)]
fn search(
    matrix: &CostMatrix,
    weights: &[f64],
    start: usize,
    end: Option<usize>,
    current: usize,
    cost_so_far: f64,
    free: &mut Vec<usize>,
    depth: usize,
    path: &mut Vec<usize>,
    best: &mut Vec<usize>,
    best_cost: &mut f64,
) {
    if cost_so_far >= *best_cost {
        return;
    }

    if depth == free.len() {
        let total = match end {
            Some(e) => cost_so_far + matrix.get(current, e) * weights[e],
            None => cost_so_far,
        };
        if total < *best_cost {
            *best_cost = total;
            best.clear();
            best.push(start);
            best.extend_from_slice(path);
            if let Some(e) = end {
                best.push(e);
            }
        }
        return;
    }

    for slot in depth..free.len() {
        free.swap(depth, slot);
        let next = free[depth];
        let step = matrix.get(current, next) * weights[next];
        path.push(next);
        search(
            matrix,
            weights,
            start,
            end,
            next,
            cost_so_far + step,
            free,
            depth + 1,
            path,
            best,
            best_cost,
        );
        path.pop();
        free.swap(depth, slot);
    }
}

/// Total weighted cost of a visitation order.
pub fn order_cost(matrix: &CostMatrix, weights: &[f64], order: &[usize]) -> f64 {
    order
        .windows(2)
        .map(|pair| matrix.get(pair[0], pair[1]) * weights[pair[1]])
        .sum()
}
