//! Best-first search over break decisions.
//!
//! A variant of Dijkstra's algorithm over the graph spanned by
//! [`FormatDecisionState`] nodes: find the cheapest sequence of break /
//! no-break decisions that places every token of a logical line. Ties are
//! broken by insertion order, and no-break successors are inserted first,
//! so equal-cost solutions prefer breaking as late and as little as
//! possible.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::format::decision_state::FormatDecisionState;

/// Once this many states have been queued, stop distinguishing states by
/// their bracket stacks to bound the search.
const STACK_COMPARISON_CUTOFF: u64 = 10_000;

/// An edge in the solution space: `state` was reached from `previous` by
/// placing one token, with or without a newline.
struct StateNode<'a> {
    state: FormatDecisionState<'a>,
    newline: bool,
    previous: Option<usize>,
}

/// Priority-queue entry ordered by `(penalty, count)`, lowest first.
#[derive(PartialEq, Eq)]
struct QueueItem {
    penalty: u64,
    count: u64,
    node: usize,
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert for lowest-penalty-first.
        other
            .penalty
            .cmp(&self.penalty)
            .then_with(|| other.count.cmp(&self.count))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Search for the cheapest layout of the line behind `initial`.
///
/// `initial` must already have consumed the line's first token. Returns one
/// newline decision per token (index 0 is always false), or None when the
/// frontier is exhausted without reaching the end of the line.
pub fn analyze_solution_space(initial: FormatDecisionState<'_>) -> Option<Vec<bool>> {
    let token_count = initial.line.tokens.len();
    let mut nodes: Vec<StateNode<'_>> = vec![StateNode {
        state: initial,
        newline: false,
        previous: None,
    }];
    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::new();
    queue.push(QueueItem {
        penalty: 0,
        count: 0,
        node: 0,
    });
    let mut count: u64 = 1;
    let mut seen: HashSet<_> = HashSet::new();

    while let Some(item) = queue.pop() {
        let node_idx = item.node;
        if nodes[node_idx].state.done() {
            return Some(reconstruct(&nodes, node_idx, token_count));
        }

        if count > STACK_COMPARISON_CUTOFF {
            nodes[node_idx].state.ignore_stack_for_comparison = true;
        }
        if !seen.insert(nodes[node_idx].state.seen_key()) {
            continue;
        }

        // The must-split check may latch state shared by both successors.
        let must_split = nodes[node_idx].state.must_split();
        for newline in [false, true] {
            if newline && !nodes[node_idx].state.can_split(must_split) {
                continue;
            }
            if !newline && must_split {
                continue;
            }
            let mut state = nodes[node_idx].state.clone();
            let (penalty, _) = state.add_token(newline, must_split);
            nodes.push(StateNode {
                state,
                newline,
                previous: Some(node_idx),
            });
            queue.push(QueueItem {
                penalty: item.penalty + penalty,
                count,
                node: nodes.len() - 1,
            });
            count += 1;
        }
    }

    None
}

/// Walk the parent chain back to the start and emit per-token decisions.
fn reconstruct(nodes: &[StateNode<'_>], end: usize, token_count: usize) -> Vec<bool> {
    let mut decisions = Vec::with_capacity(token_count);
    let mut idx = end;
    while let Some(previous) = nodes[idx].previous {
        decisions.push(nodes[idx].newline);
        idx = previous;
    }
    decisions.push(false); // first token
    decisions.reverse();
    decisions
}
