//! Scoring seam.
//!
//! The remote protocol's real scoring algorithm is not public. The agent
//! treats scoring as a pluggable capability; the default provider samples
//! placeholder values in the ranges the server accepts.

use rand::Rng;

use dva_core::Task;

/// Computes `(score, confidence)` for a fetched task.
pub trait ScoreProvider: Send + Sync {
    fn compute_score(&self, task: &Task) -> (f64, f64);
}

/// Placeholder provider: score uniform in [-1, 1], confidence in [0.5, 1].
pub struct RandomScoreProvider;

impl ScoreProvider for RandomScoreProvider {
    fn compute_score(&self, _task: &Task) -> (f64, f64) {
        let mut rng = rand::thread_rng();
        (rng.gen_range(-1.0..=1.0), rng.gen_range(0.5..=1.0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_random_scores_stay_in_accepted_ranges() {
        let task = Task::from_value(&json!({
            "id": "t1", "link": "http://x/i.jpg", "text": "cap"
        }))
        .unwrap();
        let provider = RandomScoreProvider;
        for _ in 0..500 {
            let (score, confidence) = provider.compute_score(&task);
            assert!((-1.0..=1.0).contains(&score));
            assert!((0.5..=1.0).contains(&confidence));
        }
    }
}
