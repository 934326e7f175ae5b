use std::cmp::Ordering;

use super::Palette;

/// Per-channel weights of the colour distance for one query.
#[inline]
fn weights(query: [u8; 4]) -> [u32; 4] {
    [2, 4, if query[0] < 128 { 3 } else { 2 }, 1]
}

#[inline]
fn weighted(a: [u8; 4], b: [u8; 4], w: [u32; 4]) -> u32 {
    (0..4)
        .map(|c| {
            let d = a[c] as i32 - b[c] as i32;
            w[c] * (d * d) as u32
        })
        .sum()
}

/// Weighted squared RGBA distance from `query` to `entry`.
///
/// Green counts four times, red twice, blue three times for dark queries
/// (red below 128) and twice otherwise, alpha once.
#[inline]
pub fn color_distance(query: [u8; 4], entry: [u8; 4]) -> u32 {
    weighted(query, entry, weights(query))
}

/// A search structure answering nearest palette entry queries.
///
/// Every implementation returns the entry with the smallest
/// [`color_distance`], and the lowest palette index among equally near
/// entries.
pub trait NearestColorIndex: Send + Sync {
    /// Index of the palette entry nearest to `color`.
    fn nearest(&self, color: [u8; 4]) -> usize;
}

/// Which [`NearestColorIndex`] to build for a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NearestColorStrategy {
    /// Exhaustive scan.
    Linear,
    /// Median split k-d tree over RGBA.
    #[default]
    KdTree,
    /// Cover tree with triangle inequality pruning.
    CoverTree,
}

impl NearestColorStrategy {
    /// Build the search structure for `palette`.
    pub fn build(self, palette: &Palette) -> Box<dyn NearestColorIndex> {
        let colors = palette.colors().to_vec();
        match self {
            NearestColorStrategy::Linear => Box::new(LinearSearch::new(colors)),
            NearestColorStrategy::KdTree => Box::new(KdTree::new(colors)),
            NearestColorStrategy::CoverTree => Box::new(CoverTree::new(colors)),
        }
    }
}

/// Best candidate so far, ordered by distance then index.
#[derive(Clone, Copy)]
struct Best {
    distance: u32,
    index: usize,
}

impl Best {
    const NONE: Self = Self {
        distance: u32::MAX,
        index: usize::MAX,
    };

    #[inline]
    fn offer(&mut self, distance: u32, index: usize) {
        if (distance, index) < (self.distance, self.index) {
            *self = Self { distance, index };
        }
    }

    #[inline]
    fn found(self) -> usize {
        if self.index == usize::MAX {
            0
        } else {
            self.index
        }
    }
}

/// Exhaustive nearest colour search.
pub struct LinearSearch {
    colors: Vec<[u8; 4]>,
}

impl LinearSearch {
    /// Search over `colors`.
    pub fn new(colors: Vec<[u8; 4]>) -> Self {
        Self { colors }
    }
}

impl NearestColorIndex for LinearSearch {
    fn nearest(&self, color: [u8; 4]) -> usize {
        let w = weights(color);
        let mut best = Best::NONE;
        for (i, &entry) in self.colors.iter().enumerate() {
            best.offer(weighted(color, entry, w), i);
        }
        best.found()
    }
}

struct KdNode {
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// A k-d tree over the four RGBA axes.
///
/// Every node splits at the median of its subset. Far branches are skipped
/// only when the splitting plane is strictly farther than the best match.
pub struct KdTree {
    colors: Vec<[u8; 4]>,
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl KdTree {
    /// Build a balanced tree over `colors`.
    pub fn new(colors: Vec<[u8; 4]>) -> Self {
        let mut tree = Self {
            colors,
            nodes: Vec::new(),
            root: None,
        };
        let mut indices: Vec<usize> = (0..tree.colors.len()).collect();
        tree.root = tree.build(&mut indices, 0);
        tree
    }

    fn build(&mut self, indices: &mut [usize], depth: usize) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        let axis = depth % 4;
        let colors = &self.colors;
        indices.sort_unstable_by_key(|&i| (colors[i][axis], i));
        let mid = indices.len() / 2;
        let index = indices[mid];
        let (lower, upper) = indices.split_at_mut(mid);
        let left = self.build(lower, depth + 1);
        let right = self.build(&mut upper[1..], depth + 1);
        self.nodes.push(KdNode {
            index,
            axis,
            left,
            right,
        });
        Some(self.nodes.len() - 1)
    }

    fn search(&self, node: Option<usize>, query: [u8; 4], w: [u32; 4], best: &mut Best) {
        let Some(node) = node.map(|n| &self.nodes[n]) else {
            return;
        };
        let entry = self.colors[node.index];
        best.offer(weighted(query, entry, w), node.index);

        let diff = query[node.axis] as i32 - entry[node.axis] as i32;
        let (near, far) = if diff < 0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        self.search(near, query, w, best);
        if w[node.axis] * (diff * diff) as u32 <= best.distance {
            self.search(far, query, w, best);
        }
    }
}

impl NearestColorIndex for KdTree {
    fn nearest(&self, color: [u8; 4]) -> usize {
        let mut best = Best::NONE;
        self.search(self.root, color, weights(color), &mut best);
        best.found()
    }
}

const COVER_LEAF: usize = 4;

struct CoverNode {
    index: usize,
    /// Largest distance from this node's colour to any descendant.
    radius: f64,
    children: Vec<CoverNode>,
}

/// A cover tree over the palette.
///
/// Every node covers its descendants within `radius`; children are greedy
/// covers at half the parent radius. The distance weights depend on the
/// query, so one tree is kept per weight set.
pub struct CoverTree {
    colors: Vec<[u8; 4]>,
    roots: [Option<CoverNode>; 2],
}

impl CoverTree {
    /// Build the trees over `colors`.
    pub fn new(colors: Vec<[u8; 4]>) -> Self {
        let roots = [weights([0; 4]), weights([255; 4])].map(|w| {
            (!colors.is_empty()).then(|| Self::build(&colors, 0, (1..colors.len()).collect(), w))
        });
        Self { colors, roots }
    }

    fn metric(colors: &[[u8; 4]], a: usize, b: usize, w: [u32; 4]) -> f64 {
        (weighted(colors[a], colors[b], w) as f64).sqrt()
    }

    fn build(colors: &[[u8; 4]], center: usize, members: Vec<usize>, w: [u32; 4]) -> CoverNode {
        let radius = members
            .iter()
            .map(|&m| Self::metric(colors, center, m, w))
            .fold(0.0, f64::max);

        let children = if members.len() <= COVER_LEAF {
            members
                .into_iter()
                .map(|index| CoverNode {
                    index,
                    radius: 0.0,
                    children: Vec::new(),
                })
                .collect()
        } else {
            let half = radius / 2.0;
            let mut children = Vec::new();
            let mut remaining = members;
            while let Some((&child, rest)) = remaining.split_first() {
                let (covered, uncovered): (Vec<usize>, Vec<usize>) = rest
                    .iter()
                    .partition(|&&m| Self::metric(colors, child, m, w) <= half);
                children.push(Self::build(colors, child, covered, w));
                remaining = uncovered;
            }
            children
        };

        CoverNode {
            index: center,
            radius,
            children,
        }
    }

    fn search(&self, node: &CoverNode, query: [u8; 4], w: [u32; 4], best: &mut Best) {
        best.offer(weighted(query, self.colors[node.index], w), node.index);

        let mut order: Vec<(f64, &CoverNode)> = node
            .children
            .iter()
            .map(|c| ((weighted(query, self.colors[c.index], w) as f64).sqrt(), c))
            .collect();
        order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        for (d, child) in order {
            let bound = d - child.radius;
            if bound > (best.distance as f64).sqrt() + 1e-9 {
                continue;
            }
            self.search(child, query, w, best);
        }
    }
}

impl NearestColorIndex for CoverTree {
    fn nearest(&self, color: [u8; 4]) -> usize {
        let w = weights(color);
        let root = if color[0] < 128 { &self.roots[0] } else { &self.roots[1] };
        let mut best = Best::NONE;
        if let Some(root) = root {
            self.search(root, color, w, &mut best);
        }
        best.found()
    }
}
