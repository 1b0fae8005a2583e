use crate::error::ConfigError;

/// Label of the overflow pseudo-bucket.
pub const INF: &str = "+Inf";

/// Fixed-bound histogram accumulator with explicit outlier accounting.
///
/// Counts are kept per bucket (not cumulative).  A sample lands in the
/// bucket right of its insertion point among the bounds, placed after
/// any equal bound; anything past the last bound is an outlier.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketKeep {
    bounds: Vec<f64>,
    counts: Vec<u64>,
    outlier_count: u64,
}

impl BucketKeep {
    /// Bounds must be non-empty, finite and strictly ascending.
    pub fn new(bounds: Vec<f64>) -> Result<Self, ConfigError> {
        if bounds.is_empty() {
            return Err(ConfigError::EmptyBounds);
        }
        if let Some((index, &bound)) = bounds.iter().enumerate().find(|(_, b)| !b.is_finite()) {
            return Err(ConfigError::NonFiniteBound { index, bound });
        }
        if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnorderedBounds {
                prev: pair[0],
                next: pair[1],
            });
        }

        Ok(Self {
            counts: vec![0; bounds.len()],
            bounds,
            outlier_count: 0,
        })
    }

    /// Samples that fell past the last bound so far.
    pub fn outlier_count(&self) -> u64 {
        self.outlier_count
    }

    /// Count one sample.  Never fails for finite input.
    pub fn enter(&mut self, sample: f64) {
        // Insertion point after all bounds <= sample
        let idx = self.bounds.partition_point(|b| *b <= sample);
        match self.counts.get_mut(idx) {
            Some(count) => *count += 1,
            // Past the last bound, or sitting exactly on it
            None => self.outlier_count += 1,
        }
    }

    /// Per-bound `(bound, count)` pairs followed by the `+Inf` pair, and
    /// the histogram sum.
    ///
    /// `+Inf` carries every in-range count, every outlier and one extra
    /// synthetic observation; the sum is the in-range total plus `+Inf`.
    pub fn reveal(&self) -> (Vec<(String, u64)>, u64) {
        let in_range: u64 = self.counts.iter().sum();
        let inf = in_range + self.outlier_count + 1;

        let mut buckets: Vec<(String, u64)> = self
            .bounds
            .iter()
            .zip(&self.counts)
            .map(|(bound, count)| (format!("{bound:?}"), *count))
            .collect();
        buckets.push((INF.to_owned(), inf));

        (buckets, in_range + inf)
    }

    /// Fold another keep's counts into this one.  Both must share bounds.
    pub fn absorb(&mut self, other: &BucketKeep) {
        debug_assert_eq!(self.bounds, other.bounds);
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.outlier_count += other.outlier_count;
    }
}
