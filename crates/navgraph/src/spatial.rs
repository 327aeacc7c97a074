// Spatial index over area centers
//
// An implicit 3-d tree: the point array is reordered so each subslice's
// median splits it on x, y, z in turn, with no explicit node storage.
// Equal distances resolve to the lower `NodeId` so results do not depend
// on build order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;

use crate::graph::{NavGraph, NodeId};

#[derive(Debug, Clone, Copy)]
struct Entry {
    point: Vec3,
    id: NodeId,
}

/// Candidate in the k-nearest heap; the worst candidate sits on top
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist2: f32,
    id: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist2
            .total_cmp(&other.dist2)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct KdTree {
    entries: Vec<Entry>,
}

impl KdTree {
    pub fn new(points: impl IntoIterator<Item = (NodeId, Vec3)>) -> Self {
        let mut entries: Vec<Entry> = points
            .into_iter()
            .map(|(id, point)| Entry { point, id })
            .collect();
        build(&mut entries, 0);
        KdTree { entries }
    }

    /// Index the centers of every area in `graph`
    pub fn from_graph(graph: &NavGraph) -> Self {
        Self::new(graph.areas().map(|(id, area)| (id, area.center())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closest indexed point and its distance
    pub fn nearest(&self, point: Vec3) -> Option<(NodeId, f32)> {
        self.k_nearest(point, 1).into_iter().next()
    }

    /// Up to `k` closest points, nearest first
    pub fn k_nearest(&self, point: Vec3, k: usize) -> Vec<(NodeId, f32)> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        search(&self.entries, 0, point, k, &mut heap);
        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.id, c.dist2.sqrt()))
            .collect()
    }

    /// Area under `point`, approximately
    ///
    /// The `candidates` nearest centers are tested for real containment with
    /// a height window of `below`/`above` around the floor; when none holds
    /// the point, the nearest center wins.
    pub fn find_containing(
        &self,
        graph: &NavGraph,
        point: Vec3,
        candidates: usize,
        below: f32,
        above: f32,
    ) -> Option<NodeId> {
        let nearest = self.k_nearest(point, candidates.max(1));
        nearest
            .iter()
            .find(|(id, _)| {
                graph
                    .area(*id)
                    .is_some_and(|area| area.contains(point, below, above))
            })
            .or(nearest.first())
            .map(|(id, _)| *id)
    }
}

fn axis_value(p: Vec3, axis: usize) -> f32 {
    p[axis]
}

fn build(entries: &mut [Entry], depth: usize) {
    if entries.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| {
        axis_value(a.point, axis)
            .total_cmp(&axis_value(b.point, axis))
            .then_with(|| a.id.cmp(&b.id))
    });
    let (left, rest) = entries.split_at_mut(mid);
    build(left, depth + 1);
    build(&mut rest[1..], depth + 1);
}

fn search(
    entries: &[Entry],
    depth: usize,
    point: Vec3,
    k: usize,
    heap: &mut BinaryHeap<Candidate>,
) {
    if entries.is_empty() {
        return;
    }
    let axis = depth % 3;
    let mid = entries.len() / 2;
    let here = entries[mid];

    let candidate = Candidate {
        dist2: here.point.distance_squared(point),
        id: here.id,
    };
    if heap.len() < k {
        heap.push(candidate);
    } else if heap.peek().is_some_and(|worst| candidate < *worst) {
        heap.pop();
        heap.push(candidate);
    }

    let diff = axis_value(point, axis) - axis_value(here.point, axis);
    let (near, far) = if diff < 0.0 {
        (&entries[..mid], &entries[mid + 1..])
    } else {
        (&entries[mid + 1..], &entries[..mid])
    };
    search(near, depth + 1, point, k, heap);

    // Equal distances may still hold a lower id on the far side
    let visit_far = heap.len() < k || heap.peek().is_some_and(|worst| diff * diff <= worst.dist2);
    if visit_far {
        search(far, depth + 1, point, k, heap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(points: &[(NodeId, Vec3)], query: Vec3, k: usize) -> Vec<(NodeId, f32)> {
        let mut all: Vec<Candidate> = points
            .iter()
            .map(|(id, p)| Candidate {
                dist2: p.distance_squared(query),
                id: *id,
            })
            .collect();
        all.sort();
        all.truncate(k);
        all.into_iter().map(|c| (c.id, c.dist2.sqrt())).collect()
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let points: Vec<(NodeId, Vec3)> = (0..64)
            .map(|i| {
                let p = Vec3::new(
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-200.0..200.0),
                );
                (NodeId(i), p)
            })
            .collect();
        let tree = KdTree::new(points.clone());
        assert_eq!(tree.len(), 64);

        for _ in 0..100 {
            let query = Vec3::new(
                rng.gen_range(-1200.0..1200.0),
                rng.gen_range(-1200.0..1200.0),
                rng.gen_range(-300.0..300.0),
            );
            let expected = brute_force(&points, query, 1);
            assert_eq!(tree.nearest(query), expected.first().copied());
            assert_eq!(tree.k_nearest(query, 5), brute_force(&points, query, 5));
        }
    }

    #[test]
    fn test_ties_prefer_lower_id() {
        // Four points equidistant from the origin, inserted out of order
        let points = vec![
            (NodeId(3), Vec3::new(0.0, 10.0, 0.0)),
            (NodeId(1), Vec3::new(10.0, 0.0, 0.0)),
            (NodeId(2), Vec3::new(-10.0, 0.0, 0.0)),
            (NodeId(0), Vec3::new(0.0, -10.0, 0.0)),
        ];
        let tree = KdTree::new(points);
        assert_eq!(tree.nearest(Vec3::ZERO), Some((NodeId(0), 10.0)));
        let ids: Vec<NodeId> = tree.k_nearest(Vec3::ZERO, 4).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn test_containment() {
        use crate::graph::GraphBuilder;
        use crate::mesh::{grid_mesh, RawArea};

        let settings = crate::NavSettings::default();
        let (graph, _) = GraphBuilder::new(&settings).build(&grid_mesh(4, 4, 50.0, 0.0)).unwrap();
        let tree = KdTree::from_graph(&graph);
        assert_eq!(tree.len(), 16);

        for (id, area) in graph.areas() {
            assert_eq!(tree.find_containing(&graph, area.center(), 8, 18.0, 72.0), Some(id));
        }
        // near the corner of cell 6 but inside it
        let inside = Vec3::new(98.0, 52.0, 10.0);
        let expected = graph.node_of_area(6).unwrap();
        assert_eq!(tree.find_containing(&graph, inside, 8, 18.0, 72.0), Some(expected));

        // off the mesh: falls back to the nearest center
        let outside = Vec3::new(-500.0, -500.0, 0.0);
        assert_eq!(
            tree.find_containing(&graph, outside, 8, 18.0, 72.0),
            graph.node_of_area(1)
        );

        // stacked floors: the height window picks the right one
        let lower = RawArea::flat(1, 0.0, 0.0, 100.0, 100.0, 0.0);
        let upper = RawArea::flat(2, 0.0, 0.0, 100.0, 100.0, 200.0);
        let (stacked, _) = GraphBuilder::new(&settings).build_from_areas([&lower, &upper]).unwrap();
        let tree = KdTree::from_graph(&stacked);
        let on_upper = Vec3::new(10.0, 10.0, 201.0);
        assert_eq!(tree.find_containing(&stacked, on_upper, 8, 18.0, 72.0), stacked.node_of_area(2));
    }

    #[test]
    fn test_empty_and_small_k() {
        let tree = KdTree::default();
        assert!(tree.nearest(Vec3::ZERO).is_none());
        let tree = KdTree::new([(NodeId(0), Vec3::ONE)]);
        assert_eq!(tree.k_nearest(Vec3::ZERO, 10).len(), 1);
        assert!(tree.k_nearest(Vec3::ZERO, 0).is_empty());
    }
}
