//! Ranking metrics under the sampled-candidates evaluation protocol:
//! every held-out positive is ranked against its sampled negatives.
use rayon::prelude::*;

use sampling::EvaluationInstance;
use {PredictionError, RankingModel};

/// Ranking quality under the sampled-candidates protocol.
#[derive(Clone, Debug)]
pub struct RankingMetrics {
    /// Fraction of evaluation users whose positive ranks in the top k.
    pub hit_ratio: f32,
    /// Normalized discounted cumulative gain at k.
    pub ndcg: f32,
}

fn positive_rank<T: RankingModel>(
    model: &T,
    instance: &EvaluationInstance,
) -> Result<usize, PredictionError> {
    let mut candidates = Vec::with_capacity(1 + instance.negatives.len());
    candidates.push(instance.positive);
    candidates.extend_from_slice(&instance.negatives);

    let predictions = model.predict(instance.user_id, &candidates)?;

    if predictions.len() != candidates.len() {
        return Err(PredictionError::MismatchedLength);
    }

    let positive_score = predictions[0];

    let mut rank = 0;

    for &prediction in &predictions {
        if !prediction.is_finite() {
            return Err(PredictionError::InvalidPredictionValue);
        }

        // Ties go to the positive.
        if prediction > positive_score {
            rank += 1;
        }
    }

    Ok(rank)
}

/// Compute hit ratio and NDCG at `k` over a set of evaluation instances.
///
/// A hit is scored when the positive lands among the `k` highest-scored
/// candidates; its NDCG contribution is `1 / log2(rank + 2)`.
pub fn ranking_metrics<T: RankingModel + Sync>(
    model: &T,
    instances: &[EvaluationInstance],
    k: usize,
) -> Result<RankingMetrics, PredictionError> {
    if instances.is_empty() {
        return Ok(RankingMetrics {
            hit_ratio: 0.0,
            ndcg: 0.0,
        });
    }

    let ranks = instances
        .par_iter()
        .map(|instance| positive_rank(model, instance))
        .collect::<Result<Vec<usize>, PredictionError>>()?;

    let mut hits = 0;
    let mut ndcg = 0.0;

    for &rank in &ranks {
        if rank < k {
            hits += 1;
            ndcg += 1.0 / (rank as f32 + 2.0).log2();
        }
    }

    let num_instances = instances.len() as f32;

    Ok(RankingMetrics {
        hit_ratio: hits as f32 / num_instances,
        ndcg: ndcg / num_instances,
    })
}

/// Compute the mean reciprocal rank of the positives among their
/// sampled candidates.
pub fn mrr_score<T: RankingModel + Sync>(
    model: &T,
    instances: &[EvaluationInstance],
) -> Result<f32, PredictionError> {
    if instances.is_empty() {
        return Ok(0.0);
    }

    let reciprocal_ranks = instances
        .par_iter()
        .map(|instance| positive_rank(model, instance).map(|rank| 1.0 / (rank + 1) as f32))
        .collect::<Result<Vec<f32>, PredictionError>>()?;

    Ok(reciprocal_ranks.iter().sum::<f32>() / reciprocal_ranks.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use {ItemId, UserId};

    /// Scores every item by a fixed per-item value.
    struct PopularityModel {
        scores: Vec<f32>,
    }

    impl RankingModel for PopularityModel {
        fn predict(
            &self,
            _user_id: UserId,
            item_ids: &[ItemId],
        ) -> Result<Vec<f32>, PredictionError> {
            Ok(item_ids.iter().map(|&idx| self.scores[idx]).collect())
        }
    }

    fn toy_instances() -> Vec<EvaluationInstance> {
        vec![
            EvaluationInstance {
                user_id: 0,
                positive: 0,
                negatives: vec![1, 2],
            },
            EvaluationInstance {
                user_id: 1,
                positive: 2,
                negatives: vec![0, 1],
            },
        ]
    }

    #[test]
    fn perfect_rankings_score_one() {
        // The positive is the highest-scored candidate in its pool.
        let model = PopularityModel {
            scores: vec![3.0, 2.0, 1.0],
        };

        let instances = vec![EvaluationInstance {
            user_id: 0,
            positive: 0,
            negatives: vec![1, 2],
        }];

        let metrics = ranking_metrics(&model, &instances, 1).unwrap();

        assert_eq!(metrics.hit_ratio, 1.0);
        assert_eq!(metrics.ndcg, 1.0);
        assert_eq!(mrr_score(&model, &instances).unwrap(), 1.0);
    }

    #[test]
    fn metrics_average_over_instances() {
        let model = PopularityModel {
            scores: vec![3.0, 2.0, 1.0],
        };

        // User 0's positive ranks first; user 1's positive ranks last.
        let instances = toy_instances();

        let at_one = ranking_metrics(&model, &instances, 1).unwrap();
        assert_eq!(at_one.hit_ratio, 0.5);
        assert_eq!(at_one.ndcg, 0.5);

        let at_three = ranking_metrics(&model, &instances, 3).unwrap();
        assert_eq!(at_three.hit_ratio, 1.0);

        // 1/log2(2) for rank 0, 1/log2(4) for rank 2.
        assert!((at_three.ndcg - (1.0 + 0.5) / 2.0).abs() < 1e-6);

        // Reciprocal ranks 1 and 1/3.
        let mrr = mrr_score(&model, &instances).unwrap();
        assert!((mrr - (1.0 + 1.0 / 3.0) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn ties_go_to_the_positive() {
        let model = PopularityModel {
            scores: vec![1.0, 1.0, 1.0],
        };

        let metrics = ranking_metrics(&model, &toy_instances(), 1).unwrap();

        assert_eq!(metrics.hit_ratio, 1.0);
    }

    #[test]
    fn non_finite_predictions_are_an_error() {
        let model = PopularityModel {
            scores: vec![3.0, ::std::f32::NAN, 1.0],
        };

        assert!(ranking_metrics(&model, &toy_instances(), 1).is_err());
    }

    #[test]
    fn empty_instances_score_zero() {
        let model = PopularityModel { scores: vec![] };

        let metrics = ranking_metrics(&model, &[], 10).unwrap();

        assert_eq!(metrics.hit_ratio, 0.0);
        assert_eq!(metrics.ndcg, 0.0);
        assert_eq!(mrr_score(&model, &[]).unwrap(), 0.0);
    }
}
