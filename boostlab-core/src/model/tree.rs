//! Second-order regression trees for gradient boosting.
//!
//! Trees grow level by level. At each level every open node looks for the
//! split with the largest structure-score gain, scanning each sampled
//! feature once in pre-sorted order. A node becomes a leaf when no split
//! clears the minimum gain or the depth limit is reached; its weight is
//! `-eta * G / (H + lambda)`.

use crate::model::DenseMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Smallest loss reduction accepted for a split.
const MIN_SPLIT_GAIN: f64 = 1e-6;

const NONE: usize = usize::MAX;

/// Tree node. Rows with `x[feature] < threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        gain: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => index = if row[feature] < threshold { left } else { right },
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Number of split levels on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Add each split's gain to its feature's slot.
    pub(crate) fn accumulate_gain(&self, importance: &mut [f64]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = *node {
                importance[feature] += gain;
            }
        }
    }
}

/// Row indices of every column, sorted ascending by value. Built once per fit.
pub(crate) struct SortedColumns {
    order: Vec<Vec<usize>>,
}

impl SortedColumns {
    pub(crate) fn new(x: &DenseMatrix) -> Self {
        let order = (0..x.n_cols())
            .into_par_iter()
            .map(|col| {
                let mut rows: Vec<usize> = (0..x.n_rows()).collect();
                rows.sort_by(|&a, &b| x.get(a, col).total_cmp(&x.get(b, col)));
                rows
            })
            .collect();
        Self { order }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowParams {
    pub max_depth: usize,
    pub eta: f64,
    pub lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
    pub colsample_bylevel: f64,
}

impl GrowParams {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.lambda)
    }

    fn leaf_weight(&self, g: f64, h: f64) -> f64 {
        -self.eta * g / (h + self.lambda)
    }
}

/// Sample `max(1, floor(fraction * n))` of `features`, returned sorted.
pub(crate) fn sample_features(features: &[usize], fraction: f64, rng: &mut StdRng) -> Vec<usize> {
    if fraction >= 1.0 {
        return features.to_vec();
    }
    let k = ((fraction * features.len() as f64).floor() as usize).clamp(1, features.len().max(1));
    let mut chosen: Vec<usize> = features.choose_multiple(rng, k).copied().collect();
    chosen.sort_unstable();
    chosen
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    node: usize,
    g: f64,
    h: f64,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_g: f64,
    left_h: f64,
}

/// Inputs shared by every split search of one tree.
pub(crate) struct GrowContext<'a> {
    pub x: &'a DenseMatrix,
    pub sorted: &'a SortedColumns,
    pub grad: &'a [f64],
    pub hess: &'a [f64],
}

/// Grow one tree over `rows` using only `features`.
pub(crate) fn grow(
    ctx: &GrowContext<'_>,
    rows: &[usize],
    features: &[usize],
    params: &GrowParams,
    rng: &mut StdRng,
) -> RegressionTree {
    let mut nodes = vec![Node::Leaf { value: 0.0 }];
    let mut position = vec![NONE; ctx.x.n_rows()];
    let (mut g0, mut h0) = (0.0, 0.0);
    for &r in rows {
        position[r] = 0;
        g0 += ctx.grad[r];
        h0 += ctx.hess[r];
    }

    let mut open = vec![OpenNode {
        node: 0,
        g: g0,
        h: h0,
    }];

    for depth in 0..=params.max_depth {
        if open.is_empty() {
            break;
        }
        if depth == params.max_depth || features.is_empty() {
            for o in &open {
                nodes[o.node] = Node::Leaf {
                    value: params.leaf_weight(o.g, o.h),
                };
            }
            break;
        }

        let level_features = sample_features(features, params.colsample_bylevel, rng);
        let mut slot = vec![NONE; nodes.len()];
        for (s, o) in open.iter().enumerate() {
            slot[o.node] = s;
        }

        let per_feature: Vec<Vec<Option<SplitCandidate>>> = level_features
            .par_iter()
            .map(|&f| best_splits(ctx, f, &position, &slot, &open, params))
            .collect();

        // Reduce in feature order; ties keep the lower feature index.
        let mut best: Vec<Option<SplitCandidate>> = vec![None; open.len()];
        for candidates in per_feature {
            for (current, candidate) in best.iter_mut().zip(candidates) {
                if let Some(c) = candidate {
                    if current.map_or(true, |b| c.gain > b.gain) {
                        *current = Some(c);
                    }
                }
            }
        }

        let mut next = Vec::with_capacity(open.len() * 2);
        for (o, candidate) in open.iter().zip(&best) {
            match candidate {
                Some(c) if c.gain > MIN_SPLIT_GAIN => {
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes[o.node] = Node::Split {
                        feature: c.feature,
                        threshold: c.threshold,
                        gain: c.gain,
                        left,
                        right,
                    };
                    next.push(OpenNode {
                        node: left,
                        g: c.left_g,
                        h: c.left_h,
                    });
                    next.push(OpenNode {
                        node: right,
                        g: o.g - c.left_g,
                        h: o.h - c.left_h,
                    });
                }
                _ => {
                    nodes[o.node] = Node::Leaf {
                        value: params.leaf_weight(o.g, o.h),
                    };
                }
            }
        }

        for &r in rows {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = nodes[position[r]]
            {
                position[r] = if ctx.x.get(r, feature) < threshold {
                    left
                } else {
                    right
                };
            }
        }
        open = next;
    }

    RegressionTree { nodes }
}

/// Best split on `feature` for every open node, in one sorted pass.
fn best_splits(
    ctx: &GrowContext<'_>,
    feature: usize,
    position: &[usize],
    slot: &[usize],
    open: &[OpenNode],
    params: &GrowParams,
) -> Vec<Option<SplitCandidate>> {
    let k = open.len();
    let mut acc_g = vec![0.0; k];
    let mut acc_h = vec![0.0; k];
    let mut seen = vec![0usize; k];
    let mut last = vec![f64::NAN; k];
    let mut best: Vec<Option<SplitCandidate>> = vec![None; k];

    for &r in &ctx.sorted.order[feature] {
        let node = position[r];
        if node == NONE {
            continue;
        }
        let s = slot[node];
        if s == NONE {
            continue;
        }
        let v = ctx.x.get(r, feature);

        if seen[s] > 0 && v > last[s] {
            let (gl, hl) = (acc_g[s], acc_h[s]);
            let (gr, hr) = (open[s].g - gl, open[s].h - hl);
            if hl >= params.min_child_weight && hr >= params.min_child_weight {
                let gain = params.score(gl, hl) + params.score(gr, hr)
                    - params.score(open[s].g, open[s].h)
                    - params.gamma;
                if best[s].map_or(true, |b| gain > b.gain) {
                    let mid = 0.5 * (last[s] + v);
                    best[s] = Some(SplitCandidate {
                        feature,
                        threshold: if mid > last[s] { mid } else { v },
                        gain,
                        left_g: gl,
                        left_h: hl,
                    });
                }
            }
        }

        acc_g[s] += ctx.grad[r];
        acc_h[s] += ctx.hess[r];
        seen[s] += 1;
        last[s] = v;
    }

    best
}
