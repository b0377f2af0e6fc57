use serde::Serialize;

/// Summary statistics over the per-frame fake probabilities of one video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub mean: f32,
    pub median: f32,
    /// Fraction of frames scoring strictly above 0.5.
    pub majority_ratio: f32,
}

/// Aggregate a score series. An empty series yields all zeros.
pub fn aggregate(scores: &[f32]) -> Aggregate {
    if scores.is_empty() {
        return Aggregate {
            mean: 0.0,
            median: 0.0,
            majority_ratio: 0.0,
        };
    }
    let n = scores.len();
    let mean = scores.iter().sum::<f32>() / n as f32;

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    let above = scores.iter().filter(|&&score| score > 0.5).count();
    let majority_ratio = above as f32 / n as f32;

    Aggregate {
        mean,
        median,
        majority_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_zero() {
        let agg = aggregate(&[]);
        assert_eq!(agg.mean, 0.0);
        assert_eq!(agg.median, 0.0);
        assert_eq!(agg.majority_ratio, 0.0);
    }

    #[test]
    fn test_aggregate_single_score() {
        let agg = aggregate(&[0.8]);
        assert_eq!(agg.mean, 0.8);
        assert_eq!(agg.median, 0.8);
        assert_eq!(agg.majority_ratio, 1.0);
    }

    #[test]
    fn test_aggregate_odd_count() {
        let agg = aggregate(&[0.2, 0.8, 0.9]);
        assert!((agg.mean - 0.6333333).abs() < 1e-6);
        assert_eq!(agg.median, 0.8);
        assert!((agg.majority_ratio - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_aggregate_even_count_averages_middles() {
        let agg = aggregate(&[0.1, 0.4, 0.6, 0.9]);
        assert_eq!(agg.mean, 0.5);
        assert_eq!(agg.median, 0.5);
        assert_eq!(agg.majority_ratio, 0.5);
    }

    #[test]
    fn test_aggregate_exactly_half_is_not_majority() {
        // 0.5 itself does not count toward the majority ratio.
        let agg = aggregate(&[0.5, 0.5]);
        assert_eq!(agg.majority_ratio, 0.0);
        assert_eq!(agg.median, 0.5);
    }

    #[test]
    fn test_aggregate_ignores_input_order() {
        let a = aggregate(&[0.9, 0.1, 0.5]);
        let b = aggregate(&[0.1, 0.5, 0.9]);
        assert_eq!(a, b);
    }
}
