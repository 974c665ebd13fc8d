//! Jittered wait policy for retries and idle cycles.
//!
//! All functions are pure over an injected RNG so tests can pin timing
//! with a seeded generator.

use std::time::Duration;

use rand::Rng;

/// Fixed delay after a failed cycle before the loop continues.
pub const CYCLE_ERROR_DELAY: Duration = Duration::from_secs(5);

/// Retry delay for failed attempt number `attempt` (1-based): uniform in
/// `[2n, 5n]` seconds. Linear escalation with a widening jitter window,
/// not exponential.
pub fn retry_delay<R: Rng + ?Sized>(attempt: u32, rng: &mut R) -> Duration {
    let n = attempt.max(1) as f64;
    Duration::from_secs_f64(rng.gen_range(2.0 * n..=5.0 * n))
}

/// Uniform jittered wait in `[lo, hi]` seconds.
pub fn jitter<R: Rng + ?Sized>(lo: u64, hi: u64, rng: &mut R) -> Duration {
    Duration::from_secs_f64(rng.gen_range(lo as f64..=hi as f64))
}

/// Courtesy delay between tasks within a cycle.
pub fn courtesy_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    jitter(2, 5, rng)
}

/// Wait when the task queue is empty or a cycle completes.
pub fn idle_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    jitter(10, 15, rng)
}

/// Wait when the task endpoint looks unhealthy.
pub fn unhealthy_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    jitter(30, 60, rng)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_retry_delay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=5u32 {
            for _ in 0..200 {
                let delay = retry_delay(attempt, &mut rng).as_secs_f64();
                let n = attempt as f64;
                assert!(delay >= 2.0 * n, "attempt {attempt}: {delay} < {}", 2.0 * n);
                assert!(delay <= 5.0 * n, "attempt {attempt}: {delay} > {}", 5.0 * n);
            }
        }
    }

    #[test]
    fn test_retry_delay_clamps_attempt_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let delay = retry_delay(0, &mut rng).as_secs_f64();
        assert!((2.0..=5.0).contains(&delay));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let delay = idle_delay(&mut rng).as_secs_f64();
            assert!((10.0..=15.0).contains(&delay));

            let delay = courtesy_delay(&mut rng).as_secs_f64();
            assert!((2.0..=5.0).contains(&delay));

            let delay = unhealthy_delay(&mut rng).as_secs_f64();
            assert!((30.0..=60.0).contains(&delay));
        }
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a = retry_delay(2, &mut StdRng::seed_from_u64(1));
        let b = retry_delay(2, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
