use crate::random::RandomSource;

/// Closed interval a channel value is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelRange {
    pub min: f64,
    pub max: f64,
}

impl ChannelRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Per-tick perturbation magnitude and the range the walk stays inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    pub magnitude: f64,
    pub range: ChannelRange,
}

impl WalkStep {
    pub const fn new(magnitude: f64, min: f64, max: f64) -> Self {
        Self {
            magnitude,
            range: ChannelRange::new(min, max),
        }
    }

    pub fn apply<R: RandomSource + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        bounded_walk(value, self.magnitude, self.range, rng)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One step of a bounded random walk: perturb by `U[-magnitude, magnitude]`,
/// clamp into `range`, round to two decimals.
pub fn bounded_walk<R: RandomSource + ?Sized>(
    value: f64,
    magnitude: f64,
    range: ChannelRange,
    rng: &mut R,
) -> f64 {
    let perturbed = value + rng.uniform(-magnitude, magnitude);
    round2(range.clamp(perturbed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn walk_is_clamped_from_far_outside() {
        let mut rng = StdRng::seed_from_u64(1);
        let range = ChannelRange::new(1.5, 4.0);
        assert_eq!(bounded_walk(0.2, 0.1, range, &mut rng), 1.5);
        assert_eq!(bounded_walk(120.0, 0.1, range, &mut rng), 4.0);
    }

    #[test]
    fn walk_moves_at_most_magnitude() {
        let mut rng = StdRng::seed_from_u64(2);
        let range = ChannelRange::new(45.0, 65.0);
        let mut value = 55.0;
        for _ in 0..500 {
            let next = bounded_walk(value, 0.5, range, &mut rng);
            assert!((next - value).abs() <= 0.5 + 0.01);
            assert!(range.contains(next));
            value = next;
        }
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(1479.996), 1480.0);
    }
}
