//! Reference backend: a small seeded model search over fixed candidates.

use std::fmt;
use std::time::Instant;

use polars::prelude::DataFrame;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use dew_model::{Estimator, Metric, TrainConfig, TrainingError};

use crate::contract::{Predictor, RegressionBackend};
use crate::encode::FeatureEncoder;
use crate::forest::{ForestParams, RandomForest};
use crate::linear::RidgeRegression;
use crate::matrix::Matrix;
use crate::metrics::{is_better, score};
use crate::tree::{RegressionTree, TreeParams};

const MIN_ROWS: usize = 2;
const MIN_HOLDOUT_ROWS: usize = 10;

/// One point of the search grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    Linear { lambda: f64 },
    Tree { max_depth: usize },
    Forest { n_trees: usize, max_depth: usize },
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Linear { lambda } => write!(f, "linear(lambda={lambda})"),
            Candidate::Tree { max_depth } => write!(f, "tree(max_depth={max_depth})"),
            Candidate::Forest { n_trees, max_depth } => {
                write!(f, "forest(n_trees={n_trees}, max_depth={max_depth})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FittedModel {
    Linear(RidgeRegression),
    Tree(RegressionTree),
    Forest(RandomForest),
}

impl FittedModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            FittedModel::Linear(model) => model.predict_row(row),
            FittedModel::Tree(model) => model.predict_row(row),
            FittedModel::Forest(model) => model.predict_row(row),
        }
    }

    fn predict(&self, x: &Matrix) -> Vec<f64> {
        (0..x.rows()).map(|i| self.predict_row(x.row(i))).collect()
    }
}

/// Scored candidate from one search.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub candidate: Candidate,
    pub score: f64,
}

/// Built-in [`RegressionBackend`] searching ridge, tree and forest candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRegressor {
    /// Share of rows held out for scoring when there are enough rows.
    pub holdout_fraction: f64,
    pub lambdas: Vec<f64>,
    pub tree_depths: Vec<usize>,
    pub forest: ForestParams,
}

impl Default for AutoRegressor {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            lambdas: vec![1e-4, 1e-2, 1.0],
            tree_depths: vec![4, 8, 12],
            forest: ForestParams::default(),
        }
    }
}

impl AutoRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forest_trees(mut self, n_trees: usize) -> Self {
        self.forest.n_trees = n_trees;
        self
    }

    /// Candidates in the order they are tried, following the estimator allow-list.
    pub fn candidates(&self, estimators: &[Estimator]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for estimator in estimators {
            match estimator {
                Estimator::Linear => candidates.extend(
                    self.lambdas
                        .iter()
                        .map(|&lambda| Candidate::Linear { lambda }),
                ),
                Estimator::Tree => candidates.extend(
                    self.tree_depths
                        .iter()
                        .map(|&max_depth| Candidate::Tree { max_depth }),
                ),
                Estimator::Forest => candidates.push(Candidate::Forest {
                    n_trees: self.forest.n_trees,
                    max_depth: self.forest.max_depth,
                }),
            }
        }
        candidates
    }

    fn fit_candidate(
        &self,
        candidate: Candidate,
        x: &Matrix,
        y: &[f64],
        seed: u64,
    ) -> Result<FittedModel, TrainingError> {
        match candidate {
            Candidate::Linear { lambda } => {
                RidgeRegression::fit(x, y, lambda).map(FittedModel::Linear)
            }
            Candidate::Tree { max_depth } => {
                let params = TreeParams {
                    max_depth,
                    ..TreeParams::default()
                };
                Ok(FittedModel::Tree(RegressionTree::fit(
                    x,
                    y,
                    (0..x.rows()).collect(),
                    params,
                    None,
                )))
            }
            Candidate::Forest { n_trees, max_depth } => {
                let params = ForestParams {
                    n_trees,
                    max_depth,
                    seed,
                    ..self.forest
                };
                Ok(FittedModel::Forest(RandomForest::fit(x, y, params)))
            }
        }
    }

    /// Splits row positions into (fit, evaluate) sets.
    fn holdout(&self, n: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
        let all: Vec<usize> = (0..n).collect();
        if n < MIN_HOLDOUT_ROWS {
            return (all.clone(), all);
        }
        let mut shuffled = all;
        shuffled.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        let n_eval = ((n as f64 * self.holdout_fraction).round() as usize).clamp(1, n - 1);
        let eval = shuffled.split_off(n - n_eval);
        (shuffled, eval)
    }

    /// Runs the search and returns every candidate score alongside the winner.
    pub fn search(
        &self,
        features: &DataFrame,
        target: &[f64],
        config: &TrainConfig,
    ) -> Result<(AutoPredictor, Vec<CandidateScore>), TrainingError> {
        let n = target.len();
        if n < MIN_ROWS {
            return Err(TrainingError::InsufficientData {
                required: MIN_ROWS,
                actual: n,
            });
        }
        if target.iter().all(|v| (v - target[0]).abs() <= f64::EPSILON) {
            return Err(TrainingError::ConstantTarget);
        }
        let candidates = self.candidates(&config.estimators);
        if candidates.is_empty() {
            return Err(TrainingError::NoCandidates);
        }

        let names: Vec<String> = features
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let encoder = FeatureEncoder::fit(features, &names)?;
        let x = encoder.transform(features)?;

        let (fit_rows, eval_rows) = self.holdout(n, config.seed);
        let x_fit = x.select_rows(&fit_rows);
        let y_fit: Vec<f64> = fit_rows.iter().map(|&i| target[i]).collect();
        let x_eval = x.select_rows(&eval_rows);
        let y_eval: Vec<f64> = eval_rows.iter().map(|&i| target[i]).collect();

        let started = Instant::now();
        let budget = config.time_budget();
        let mut scores: Vec<CandidateScore> = Vec::new();
        let mut best: Option<CandidateScore> = None;
        let mut last_error: Option<TrainingError> = None;

        for candidate in candidates {
            if started.elapsed() >= budget {
                warn!(
                    budget_secs = config.time_budget_secs,
                    scored = scores.len(),
                    "time budget exhausted, stopping search"
                );
                break;
            }
            let model = match self.fit_candidate(candidate, &x_fit, &y_fit, config.seed) {
                Ok(model) => model,
                Err(err) => {
                    warn!(%candidate, error = %err, "candidate failed");
                    last_error = Some(err);
                    continue;
                }
            };
            let value = score(config.metric, &y_eval, &model.predict(&x_eval));
            debug!(%candidate, metric = %config.metric, score = value, "candidate scored");
            let entry = CandidateScore {
                candidate,
                score: value,
            };
            let wins = best
                .as_ref()
                .is_none_or(|current| is_better(config.metric, value, current.score));
            if wins {
                best = Some(entry.clone());
            }
            scores.push(entry);
        }

        let Some(best) = best else {
            return Err(last_error.unwrap_or(TrainingError::BudgetExhausted {
                budget_secs: config.time_budget_secs,
            }));
        };

        let model = self.fit_candidate(best.candidate, &x, target, config.seed)?;
        info!(
            model = %best.candidate,
            metric = %config.metric,
            score = best.score,
            candidates = scores.len(),
            "selected model"
        );
        let predictor = AutoPredictor {
            encoder,
            model,
            candidate: best.candidate,
            score: best.score,
            metric: config.metric,
        };
        Ok((predictor, scores))
    }
}

impl RegressionBackend for AutoRegressor {
    fn name(&self) -> &str {
        "auto"
    }

    fn fit(
        &self,
        features: &DataFrame,
        target: &[f64],
        config: &TrainConfig,
    ) -> Result<Box<dyn Predictor>, TrainingError> {
        let (predictor, _) = self.search(features, target, config)?;
        Ok(Box::new(predictor))
    }
}

/// Predictor produced by [`AutoRegressor`].
#[derive(Debug, Clone, PartialEq)]
pub struct AutoPredictor {
    encoder: FeatureEncoder,
    model: FittedModel,
    candidate: Candidate,
    score: f64,
    metric: Metric,
}

impl AutoPredictor {
    pub fn candidate(&self) -> Candidate {
        self.candidate
    }

    /// Score of the winning candidate during the search.
    pub fn score(&self) -> f64 {
        self.score
    }
}

impl Predictor for AutoPredictor {
    fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>, TrainingError> {
        let x = self.encoder.transform(frame)?;
        Ok(self.model.predict(&x))
    }

    fn features(&self) -> &[String] {
        self.encoder.names()
    }

    fn describe(&self) -> String {
        format!("{} ({} = {:.4})", self.candidate, self.metric, self.score)
    }
}
