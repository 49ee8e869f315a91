/// One depth of the blocking hierarchy.
///
/// Level `k` accumulates running statistics over the averages of 2^k
/// consecutive raw samples, and holds at most one completed block that is
/// still waiting for a partner to form the next coarser block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    count: u64,
    mean: f64,
    m2: f64,
    pending: Option<f64>,
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_raw_parts(count: u64, mean: f64, m2: f64, pending: Option<f64>) -> Self {
        Self {
            count,
            mean,
            m2,
            pending,
        }
    }

    /// Folds one block-value into the running statistics.
    ///
    /// Welford's online update. Non-finite values propagate through the
    /// statistics instead of being rejected.
    pub fn record(&mut self, x: f64) {
        self.count += 1;
        let delta1 = x - self.mean;
        self.mean += delta1 / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta1 * delta2;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the block-values folded so far; NaN before the first one.
    pub fn mean(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.mean }
    }

    /// Unbiased sample variance of the block-values; NaN below two blocks.
    pub fn sample_var(&self) -> f64 {
        if self.count < 2 {
            f64::NAN
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard error of this level's block mean; NaN below two blocks.
    pub fn error_bar(&self) -> f64 {
        (self.sample_var() / self.count as f64).sqrt()
    }

    pub(crate) fn raw_mean(&self) -> f64 {
        self.mean
    }

    pub(crate) fn raw_m2(&self) -> f64 {
        self.m2
    }

    pub(crate) fn pending(&self) -> Option<f64> {
        self.pending
    }

    pub(crate) fn take_pending(&mut self) -> Option<f64> {
        self.pending.take()
    }

    /// Parks a completed block until its partner arrives. The slot must be
    /// empty.
    pub(crate) fn park(&mut self, block: f64) {
        self.pending = Some(block);
    }

    /// Pooled combination of two accumulators over disjoint block
    /// populations (parallel Welford). Pending slots are not carried over;
    /// the caller decides where unpaired blocks go.
    pub(crate) fn pooled(a: &Level, b: &Level) -> Level {
        let count = a.count + b.count;
        if count == 0 {
            return Level::new();
        }
        let n_a = a.count as f64;
        let n_b = b.count as f64;
        let n = count as f64;
        let delta = b.mean - a.mean;
        Level {
            count,
            mean: a.mean + delta * n_b / n,
            m2: a.m2 + b.m2 + delta * delta * n_a * n_b / n,
            pending: None,
        }
    }

    /// This level's statistics with the pending slot cleared.
    pub(crate) fn stats_only(&self) -> Level {
        Level {
            pending: None,
            ..self.clone()
        }
    }
}
