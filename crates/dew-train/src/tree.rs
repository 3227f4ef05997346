//! CART regression trees.

use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

use crate::matrix::Matrix;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_leaf: 3,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary regression tree stored as a node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Builder<'a> {
    x: &'a Matrix,
    y: &'a [f64],
    params: TreeParams,
    rng: Option<&'a mut ChaCha8Rng>,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Grows a tree on the rows listed in `rows` (duplicates allowed).
    ///
    /// `rng` is required only when `params.max_features` limits the features
    /// per split; without it every feature is examined.
    pub fn fit(
        x: &Matrix,
        y: &[f64],
        rows: Vec<usize>,
        params: TreeParams,
        rng: Option<&mut ChaCha8Rng>,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(rows, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf(_)))
            .count()
    }
}

impl Builder<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        let mean = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|&i| self.y[i]).sum::<f64>() / rows.len() as f64
        };
        self.nodes.push(Node::Leaf(mean));

        if depth >= self.params.max_depth || rows.len() < 2 * self.params.min_samples_leaf.max(1) {
            return index;
        }
        let Some(best) = self.best_split(&rows) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.x.get(i, best.feature) <= best.threshold);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        index
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let d = self.x.cols();
        match (self.params.max_features, self.rng.as_deref_mut()) {
            (Some(k), Some(rng)) if k < d => {
                let mut picked = sample(rng, d, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..d).collect(),
        }
    }

    /// Split maximising `sum_l^2 / n_l + sum_r^2 / n_r`, which minimises the
    /// summed squared error of the two children.
    fn best_split(&mut self, rows: &[usize]) -> Option<BestSplit> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total: f64 = rows.iter().map(|&i| self.y[i]).sum();
        let parent = total * total / n as f64;
        let mut best: Option<BestSplit> = None;

        for feature in self.candidate_features() {
            let mut sorted: Vec<(f64, f64)> = rows
                .iter()
                .map(|&i| (self.x.get(i, feature), self.y[i]))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for split in 1..n {
                left_sum += sorted[split - 1].1;
                if split < min_leaf || n - split < min_leaf {
                    continue;
                }
                let (lower, upper) = (sorted[split - 1].0, sorted[split].0);
                if lower >= upper {
                    continue;
                }
                let right_sum = total - left_sum;
                let score = left_sum * left_sum / split as f64
                    + right_sum * right_sum / (n - split) as f64;
                let improves = score > parent + 1e-12;
                let beats = best.as_ref().is_none_or(|current| score > current.score);
                if improves && beats {
                    best = Some(BestSplit {
                        feature,
                        threshold: lower + (upper - lower) / 2.0,
                        score,
                    });
                }
            }
        }
        best
    }
}
