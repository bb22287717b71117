use serde::{Deserialize, Serialize};

/// Fixed-bucket histogram over unsigned samples.
///
/// Values are binned as `value / bucket_size`; samples past the last
/// bucket land in `overflow`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub bucket_size: u64,
    pub buckets: Vec<u64>,
    pub overflow: u64,
    pub count: u64,
    pub sum: u64,
    pub max: u64,
    /// Raw samples, retained only with full-resolution stats.
    #[cfg(feature = "detailed-stats")]
    pub samples: Vec<u64>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::new(64, 1)
    }
}

impl Distribution {
    #[must_use]
    pub fn new(num_buckets: usize, bucket_size: u64) -> Self {
        assert!(num_buckets > 0);
        assert!(bucket_size > 0);
        Self {
            bucket_size,
            buckets: vec![0; num_buckets],
            overflow: 0,
            count: 0,
            sum: 0,
            max: 0,
            #[cfg(feature = "detailed-stats")]
            samples: Vec::new(),
        }
    }

    pub fn sample(&mut self, value: u64) {
        let bucket = (value / self.bucket_size) as usize;
        match self.buckets.get_mut(bucket) {
            Some(count) => *count += 1,
            None => self.overflow += 1,
        }
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
        #[cfg(feature = "detailed-stats")]
        self.samples.push(value);
    }

    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum as f64 / self.count as f64)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl std::ops::AddAssign for Distribution {
    fn add_assign(&mut self, other: Self) {
        assert_eq!(self.bucket_size, other.bucket_size);
        assert_eq!(self.buckets.len(), other.buckets.len());
        for (bucket, count) in self.buckets.iter_mut().zip(other.buckets) {
            *bucket += count;
        }
        self.overflow += other.overflow;
        self.count += other.count;
        self.sum += other.sum;
        self.max = self.max.max(other.max);
        #[cfg(feature = "detailed-stats")]
        self.samples.extend(other.samples);
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mean() {
            Some(mean) => write!(
                f,
                "Distribution(count={}, mean={:.2}, max={})",
                self.count, mean, self.max
            ),
            None => write!(f, "Distribution(empty)"),
        }
    }
}
