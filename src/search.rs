use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;
use std::ops::Add;

/// A graph that `shortest_path` can search.
///
/// The search knows nothing about the nodes beyond what this trait tells it:
/// how they connect, what each edge costs, how far a node might be from a
/// destination, and how to choose between two nodes that are otherwise
/// equally good.
pub trait SearchSpace {
    type Node: Clone + Eq + Hash;

    /// Edge costs. `Default::default()` must be zero.
    type Cost: Copy + Ord + Add<Output = Self::Cost> + Default;

    /// A key for breaking ties. Given two nodes that look equally promising,
    /// the search prefers the one with the lower rank.
    type Rank: Ord;

    /// All nodes directly reachable from `node`.
    fn adjacent(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// A lower bound on the cost of any path from `from` to `to`. These need
    /// not be adjacent. If this ever overestimates, the path found may not be
    /// the cheapest.
    fn heuristic(&self, from: &Self::Node, to: &Self::Node) -> Self::Cost;

    /// The cost of the edge from `from` to its neighbor `to`.
    fn cost(&self, from: &Self::Node, to: &Self::Node) -> Self::Cost;

    fn rank(&self, node: &Self::Node) -> Self::Rank;
}

/// A path found by `shortest_path`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path<N, W> {
    /// The nodes along the path, not including the start, but including the
    /// destination. Empty if the start was itself a destination.
    pub nodes: Vec<N>,

    /// The total cost of the path's edges.
    pub cost: W,
}

impl<N, W> Path<N, W> {
    pub fn first_step(&self) -> Option<&N> {
        self.nodes.first()
    }

    /// Where this path ends, or `None` if it doesn't go anywhere.
    pub fn destination(&self) -> Option<&N> {
        self.nodes.last()
    }
}

/// Use the A* algorithm to find a cheapest path from `start` to any of
/// `destinations` through `space`.
///
/// Nodes are explored in order of their estimated total cost: the known cost
/// from `start`, plus the smallest heuristic estimate to any destination.
/// Among nodes with equal estimates, the one with the lowest rank goes
/// first. The search stops at the first destination it explores.
///
/// When a second path to a node turns up that costs exactly as much as the
/// one already recorded, the new path replaces it only if its last step comes
/// from a lower-ranked node. This makes the choice among equally cheap paths
/// depend only on ranks, not on the order the search happened to discover
/// them.
///
/// Return `None` if no destination is reachable, including when
/// `destinations` is empty. If `start` is a destination, return an empty path.
pub fn shortest_path<S>(
    space: &S,
    start: S::Node,
    destinations: &[S::Node],
) -> Option<Path<S::Node, S::Cost>>
where
    S: SearchSpace,
{
    if destinations.is_empty() {
        return None;
    }
    let goals = destinations.iter().collect::<HashSet<_>>();
    let remaining = |node: &S::Node| {
        destinations
            .iter()
            .map(|d| space.heuristic(node, d))
            .min()
            .unwrap_or_default()
    };

    // The cheapest known cost from `start` to each node we've seen.
    let mut known = HashMap::new();
    // The node preceding each node on its cheapest known path.
    let mut came_from: HashMap<S::Node, S::Node> = HashMap::new();
    // Nodes whose cheapest path is settled.
    let mut closed = HashSet::new();
    let mut pending = BinaryHeap::new();

    known.insert(start.clone(), S::Cost::default());
    pending.push(Pending {
        estimate: remaining(&start),
        rank: space.rank(&start),
        node: start.clone(),
    });

    while let Some(Pending { node: current, .. }) = pending.pop() {
        // A node gets pushed again each time we find a better path to it; only
        // the first pop counts.
        if !closed.insert(current.clone()) {
            continue;
        }

        let cost_so_far = known[&current];
        if goals.contains(&current) {
            return Some(Path {
                nodes: walk_back(&came_from, &start, current),
                cost: cost_so_far,
            });
        }

        for neighbor in space.adjacent(&current) {
            if closed.contains(&neighbor) {
                continue;
            }

            let cost = cost_so_far + space.cost(&current, &neighbor);
            match known.get(&neighbor) {
                Some(&best) if cost > best => continue,
                Some(&best) if cost == best => {
                    if let Some(previous) = came_from.get(&neighbor) {
                        if space.rank(&current) >= space.rank(previous) {
                            continue;
                        }
                    }
                }
                _ => (),
            }

            came_from.insert(neighbor.clone(), current.clone());
            known.insert(neighbor.clone(), cost);
            pending.push(Pending {
                estimate: cost + remaining(&neighbor),
                rank: space.rank(&neighbor),
                node: neighbor,
            });
        }
    }

    None
}

/// Follow `came_from` links back from `end` to `start`, and return the nodes
/// passed along the way in forward order, excluding `start`.
fn walk_back<N>(came_from: &HashMap<N, N>, start: &N, end: N) -> Vec<N>
where
    N: Clone + Eq + Hash,
{
    let mut nodes = Vec::new();
    let mut node = end;
    while node != *start {
        let previous = came_from[&node].clone();
        nodes.push(node);
        node = previous;
    }
    nodes.reverse();
    nodes
}

/// A node waiting to be explored.
struct Pending<N, W, R> {
    /// The cost from `start` to `node`, plus the heuristic's estimate of the
    /// rest of the way.
    estimate: W,
    rank: R,
    node: N,
}

// For the sake of `BinaryHeap`, we make `Pending`s ordered with respect to
// each other: A is 'greater than' B if A should be explored before B. That
// means a lower estimate, or an equal estimate and a lower rank.
impl<N, W: Ord, R: Ord> PartialEq for Pending<N, W, R> {
    fn eq(&self, other: &Pending<N, W, R>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N, W: Ord, R: Ord> Eq for Pending<N, W, R> {}

impl<N, W: Ord, R: Ord> Ord for Pending<N, W, R> {
    fn cmp(&self, other: &Pending<N, W, R>) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl<N, W: Ord, R: Ord> PartialOrd for Pending<N, W, R> {
    fn partial_cmp(&self, other: &Pending<N, W, R>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::Grid;
    use crate::{Manhattan, Point};

    /// A weighted directed graph, with optional per-node estimates of the
    /// remaining distance. Nodes rank by their own value.
    struct EdgeList {
        edges: Vec<(i32, i32, u32)>,
        estimates: Vec<(i32, u32)>,
    }

    impl EdgeList {
        fn new(edges: Vec<(i32, i32, u32)>) -> EdgeList {
            EdgeList {
                edges,
                estimates: vec![],
            }
        }

        fn path(&self, start: i32, destinations: &[i32]) -> Option<(Vec<i32>, u32)> {
            shortest_path(self, start, destinations).map(|p| (p.nodes, p.cost))
        }
    }

    impl SearchSpace for EdgeList {
        type Node = i32;
        type Cost = u32;
        type Rank = i32;

        fn adjacent(&self, node: &i32) -> Vec<i32> {
            self.edges
                .iter()
                .filter(|(from, _, _)| from == node)
                .map(|(_, to, _)| *to)
                .collect()
        }

        fn heuristic(&self, from: &i32, _to: &i32) -> u32 {
            self.estimates
                .iter()
                .find(|(node, _)| node == from)
                .map_or(0, |(_, estimate)| *estimate)
        }

        fn cost(&self, from: &i32, to: &i32) -> u32 {
            self.edges
                .iter()
                .filter(|(f, t, _)| f == from && t == to)
                .map(|(_, _, weight)| *weight)
                .min()
                .expect("cost requested for missing edge")
        }

        fn rank(&self, node: &i32) -> i32 {
            *node
        }
    }

    #[test]
    #[rustfmt::skip]
    fn test_shortest_path() {
        let graph = EdgeList::new(vec![(2,3,1), (0,1,1), (1,2,1)]);
        assert_eq!(graph.path(0, &[3]), Some((vec![1, 2, 3], 3)));

        // Fewer edges isn't cheaper.
        let graph = EdgeList::new(vec![(0, 1, 2), (1, 3, 1),
                                       (0, 2, 1), (2, 3, 3),
                                       (0, 3, 5)]);
        assert_eq!(graph.path(0, &[3]), Some((vec![1, 3], 3)));

        // The nearest of several destinations wins.
        let graph = EdgeList::new(vec![(0, 1, 1), (1, 2, 1), (0, 5, 1)]);
        assert_eq!(graph.path(0, &[2, 5]), Some((vec![5], 1)));
        assert_eq!(graph.path(0, &[2]), Some((vec![1, 2], 2)));
    }

    #[test]
    fn test_no_path() {
        let graph = EdgeList::new(vec![(0, 1, 1), (1, 0, 1), (2, 3, 1)]);
        assert_eq!(graph.path(0, &[3]), None);
        assert_eq!(graph.path(0, &[]), None);
    }

    #[test]
    fn test_start_is_destination() {
        let graph = EdgeList::new(vec![(0, 1, 1)]);
        assert_eq!(graph.path(0, &[1, 0]), Some((vec![], 0)));
    }

    #[test]
    fn test_equal_cost_tie_break() {
        // Node 2 looks closer to the goal, so the search reaches 3 through it
        // first. The equally cheap path through 1 replaces it, because 1
        // ranks ahead of 2.
        let mut graph = EdgeList::new(vec![(0, 2, 1), (0, 1, 1), (1, 3, 1), (2, 3, 1)]);
        graph.estimates = vec![(1, 1), (2, 0)];
        assert_eq!(graph.path(0, &[3]), Some((vec![1, 3], 2)));

        // Here the path through 1 is found first, and the later path through
        // 2 does not displace it.
        let mut graph = EdgeList::new(vec![(0, 1, 1), (0, 2, 1), (1, 3, 1), (2, 3, 1)]);
        graph.estimates = vec![(1, 0), (2, 1)];
        assert_eq!(graph.path(0, &[3]), Some((vec![1, 3], 2)));

        // Equal estimates are explored in rank order.
        let graph = EdgeList::new(vec![(0, 7, 1), (0, 4, 1), (7, 9, 1), (4, 8, 1)]);
        assert_eq!(graph.path(0, &[9, 8]), Some((vec![4, 8], 2)));
    }

    /// An open field with a few walls, searched by Manhattan distance.
    struct Field(Grid<bool>);

    impl SearchSpace for Field {
        type Node = Point;
        type Cost = usize;
        type Rank = Point;

        fn adjacent(&self, p: &Point) -> Vec<Point> {
            self.0.neighbors(*p).filter(|&n| self.0[n]).collect()
        }

        fn heuristic(&self, from: &Point, to: &Point) -> usize {
            from.manhattan(*to)
        }

        fn cost(&self, _from: &Point, _to: &Point) -> usize {
            1
        }

        fn rank(&self, p: &Point) -> Point {
            *p
        }
    }

    #[test]
    fn test_field() {
        // A wall down the middle, with a gap at the bottom.
        let field = Field(Grid::from_fn(5, 4, |p| p.x != 2 || p.y == 3));
        let path = shortest_path(&field, Point::new(0, 0), &[Point::new(4, 0)])
            .expect("path around the wall");
        assert_eq!(path.cost, 10);
        assert_eq!(path.nodes.len(), 10);
        assert_eq!(path.destination(), Some(&Point::new(4, 0)));
        assert!(path.nodes.contains(&Point::new(2, 3)));

        // Sealed off.
        let field = Field(Grid::from_fn(5, 4, |p| p.x != 2));
        assert_eq!(shortest_path(&field, Point::new(0, 0), &[Point::new(4, 0)]), None);
    }
}
