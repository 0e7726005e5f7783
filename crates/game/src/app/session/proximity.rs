use engine::{Rect, Vec2};
use rand::Rng;

/// Strictly closer than `threshold`.
pub(crate) fn is_near(a: Vec2, b: Vec2, threshold: f32) -> bool {
    a.distance(b) < threshold
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FarPosition {
    pub(crate) position: Vec2,
    pub(crate) distance: f32,
    pub(crate) attempts: u32,
    /// False when the retry cap ran out and `position` is only the farthest
    /// candidate seen.
    pub(crate) satisfied: bool,
}

/// Rejection-samples `bounds` for a point at least `min_distance` from
/// `exclusion_center`, giving up after `max_attempts` samples.
pub(crate) fn random_far_position(
    rng: &mut impl Rng,
    bounds: Rect,
    exclusion_center: Vec2,
    min_distance: f32,
    max_attempts: u32,
) -> FarPosition {
    sample_far_position(
        || {
            Vec2::new(
                sample_axis(rng, bounds.min.x, bounds.max.x),
                sample_axis(rng, bounds.min.y, bounds.max.y),
            )
        },
        exclusion_center,
        min_distance,
        max_attempts,
    )
}

fn sample_axis(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

fn sample_far_position(
    mut sample: impl FnMut() -> Vec2,
    exclusion_center: Vec2,
    min_distance: f32,
    max_attempts: u32,
) -> FarPosition {
    let max_attempts = max_attempts.max(1);
    let first = sample();
    let first_distance = first.distance(exclusion_center);
    let mut best = FarPosition {
        position: first,
        distance: first_distance,
        attempts: 1,
        satisfied: first_distance >= min_distance,
    };

    let mut attempts = 1;
    while !best.satisfied && attempts < max_attempts {
        attempts += 1;
        let candidate = sample();
        let distance = candidate.distance(exclusion_center);
        if distance > best.distance {
            best = FarPosition {
                position: candidate,
                distance,
                attempts,
                satisfied: distance >= min_distance,
            };
        }
    }
    best.attempts = attempts;
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn near_is_strict_less_than() {
        let origin = Vec2::new(0.0, 0.0);
        assert!(is_near(origin, Vec2::new(149.9, 0.0), 150.0));
        assert!(!is_near(origin, Vec2::new(150.0, 0.0), 150.0));
        assert!(is_near(origin, Vec2::new(60.0, 80.0), 100.5));
        assert!(!is_near(origin, Vec2::new(60.0, 80.0), 100.0));
    }

    #[test]
    fn sampled_positions_respect_separation_and_bounds() {
        let bounds = Rect::from_size(1024.0, 1024.0).inset(50.0);
        let center = Vec2::new(875.0, 480.0);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = random_far_position(&mut rng, bounds, center, 300.0, 64);
            assert!(result.satisfied, "seed={seed}");
            assert!(result.position.distance(center) >= 300.0, "seed={seed}");
            assert!(result.position.x >= 50.0 && result.position.x <= 974.0);
            assert!(result.position.y >= 50.0 && result.position.y <= 974.0);
        }
    }

    #[test]
    fn exhausted_retries_fall_back_to_farthest_candidate() {
        let candidates = [
            Vec2::new(10.0, 0.0),
            Vec2::new(40.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(5.0, 0.0),
        ];
        let mut next = candidates.iter().copied();
        let result = sample_far_position(
            || next.next().unwrap_or_default(),
            Vec2::new(0.0, 0.0),
            100.0,
            4,
        );
        assert!(!result.satisfied);
        assert_eq!(result.position, Vec2::new(40.0, 0.0));
        assert_eq!(result.attempts, 4);
    }

    #[test]
    fn best_distance_never_decreases_as_attempts_grow() {
        let candidates = [3.0, 9.0, 1.0, 12.0, 7.0, 2.0];
        let mut previous = 0.0;
        for cap in 1..=candidates.len() as u32 {
            let mut next = candidates.iter().map(|x| Vec2::new(*x, 0.0));
            let result = sample_far_position(
                || next.next().unwrap_or_default(),
                Vec2::new(0.0, 0.0),
                100.0,
                cap,
            );
            assert!(result.distance >= previous, "cap={cap}");
            previous = result.distance;
        }
        assert_eq!(previous, 12.0);
    }

    #[test]
    fn stops_at_first_satisfying_candidate() {
        let mut calls = 0;
        let result = sample_far_position(
            || {
                calls += 1;
                Vec2::new(calls as f32 * 100.0, 0.0)
            },
            Vec2::new(0.0, 0.0),
            250.0,
            10,
        );
        assert!(result.satisfied);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.position, Vec2::new(300.0, 0.0));
    }

    #[test]
    fn zero_attempt_cap_still_samples_once() {
        let result = sample_far_position(|| Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0), 500.0, 0);
        assert_eq!(result.attempts, 1);
        assert!(!result.satisfied);
    }

    #[test]
    fn collapsed_bounds_return_their_center() {
        let bounds = Rect::from_size(60.0, 60.0).inset(50.0);
        let mut rng = StdRng::seed_from_u64(7);
        let result = random_far_position(&mut rng, bounds, Vec2::new(0.0, 0.0), 10.0, 3);
        assert_eq!(result.position, Vec2::new(30.0, 30.0));
    }
}
