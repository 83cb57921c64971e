use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Iterate over every node reachable from `start`, in breadth-first order.
///
/// Each item is a pair `(node, distance)`, where `distance` is the number of
/// edges in a shortest path from `start` to `node`. The first item is always
/// `(start, 0)`, and distances never decrease. Each reachable node is
/// produced exactly once.
///
/// The graph itself is determined by the `neighbors` function. Given any node,
/// `neighbors` must return an iterator over all its immediate neighbor nodes.
/// Nodes are produced in the order they were first found, so if `neighbors`
/// lists them in some preferred order, ties in distance follow it.
pub fn flood_fill<N, F, I>(start: N, neighbors: F) -> FloodFill<N, F>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut pending = VecDeque::new();
    pending.push_back((start.clone(), 0));

    let mut queued = HashSet::new();
    queued.insert(start);

    FloodFill {
        queued,
        pending,
        neighbors,
    }
}

pub struct FloodFill<N, F> {
    /// Every node that has ever been pushed on `pending`.
    queued: HashSet<N>,
    pending: VecDeque<(N, usize)>,
    neighbors: F,
}

impl<N, F, I> Iterator for FloodFill<N, F>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    type Item = (N, usize);

    fn next(&mut self) -> Option<(N, usize)> {
        let (node, distance) = self.pending.pop_front()?;
        for neighbor in (self.neighbors)(&node) {
            if self.queued.insert(neighbor.clone()) {
                self.pending.push_back((neighbor, distance + 1));
            }
        }
        Some((node, distance))
    }
}
