use crate::error::StateError;
use crate::observable::level::Level;
use crate::observable::report::{BlockReport, BlockRow};

/// Minimum completed blocks a level needs before it can anchor the
/// error-bar estimate. Coarser levels de-correlate the samples, but a
/// standard error taken from fewer blocks than this is dominated by its own
/// noise.
pub const ERROR_BAR_MIN_BLOCKS: u64 = 512;

/// Relative agreement between the two coarsest usable levels required by
/// [`BlockedObservable::converged`].
const CONVERGENCE_REL_TOL: f64 = 0.1;

/// Streaming scalar observable with blocking (binning) error analysis.
///
/// Ingests one sample at a time and maintains, per power-of-two block size,
/// running statistics of the block averages. The hierarchy needs O(log N)
/// memory for N samples; the full sample history is never stored.
///
/// Level 0 accumulates the raw samples. Whenever two blocks of size 2^k have
/// both arrived, their average is folded into level k+1 and forwarded for
/// pairing one level up, so level k always holds statistics over
/// `total_count >> k` completed blocks plus at most one block still waiting
/// for its partner.
///
/// Queries on an empty observable return NaN rather than failing; non-finite
/// samples are accepted and poison the statistics from that point on, which
/// is the debuggable behavior for a numeric pipeline.
#[derive(Debug, Clone, Default)]
pub struct BlockedObservable {
    levels: Vec<Level>,
    total_count: u64,
}

impl BlockedObservable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_raw_parts(levels: Vec<Level>, total_count: u64) -> Self {
        Self {
            levels,
            total_count,
        }
    }

    pub(crate) fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Ingests one raw sample.
    ///
    /// The sample is folded into level 0. A completed pair at level k turns
    /// into its average, which is folded into level k+1 and parked there
    /// until its own partner arrives; the chain continues as far up as pairs
    /// keep completing. New levels are created lazily the first time a value
    /// propagates to them.
    pub fn add_measurement(&mut self, value: f64) {
        self.total_count += 1;
        let mut carry = value;
        for depth in 0.. {
            if depth == self.levels.len() {
                self.levels.push(Level::new());
            }
            let level = &mut self.levels[depth];
            level.record(carry);
            match level.take_pending() {
                None => {
                    level.park(carry);
                    break;
                }
                Some(partner) => carry = 0.5 * (partner + carry),
            }
        }
    }

    /// Total raw samples ingested so far.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of hierarchy levels currently materialized.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Running mean over all raw samples; NaN before the first sample.
    pub fn mean(&self) -> f64 {
        match self.levels.first() {
            Some(level) => level.mean(),
            None => f64::NAN,
        }
    }

    /// Error estimate for [`mean`](Self::mean), taken from the coarsest
    /// level that still holds at least [`ERROR_BAR_MIN_BLOCKS`] completed
    /// blocks. Short streams fall back to the raw-sample level; NaN below
    /// two samples.
    pub fn error_bar(&self) -> f64 {
        match self.anchor_level() {
            Some(level) => level.error_bar(),
            None => f64::NAN,
        }
    }

    fn anchor_level(&self) -> Option<&Level> {
        self.levels
            .iter()
            .rev()
            .find(|level| level.count() >= ERROR_BAR_MIN_BLOCKS)
            .or_else(|| self.levels.first().filter(|level| level.count() >= 2))
    }

    /// Whether the blocking analysis has plateaued.
    ///
    /// True when the level anchoring [`error_bar`](Self::error_bar) and the
    /// next finer level agree within 10% relative. False while no level is
    /// populated well enough to anchor the estimate.
    pub fn converged(&self) -> bool {
        let anchor = self
            .levels
            .iter()
            .rposition(|level| level.count() >= ERROR_BAR_MIN_BLOCKS);
        let Some(k) = anchor else {
            return false;
        };
        if k == 0 {
            return false;
        }
        let coarse = self.levels[k].error_bar();
        let fine = self.levels[k - 1].error_bar();
        if !coarse.is_finite() || !fine.is_finite() {
            return false;
        }
        if coarse == 0.0 && fine == 0.0 {
            return true;
        }
        (coarse - fine).abs() <= CONVERGENCE_REL_TOL * coarse.abs().max(fine.abs())
    }

    /// Per-level `(mean, error_bar, num_blocks)` table, finest level first.
    ///
    /// Levels with fewer than two completed blocks report a NaN error bar;
    /// zero would claim a precision the data cannot support.
    pub fn block_report(&self) -> BlockReport {
        let rows = self
            .levels
            .iter()
            .map(|level| BlockRow {
                mean: level.mean(),
                error_bar: level.error_bar(),
                num_blocks: level.count(),
            })
            .collect();
        BlockReport::new(self.mean(), self.error_bar(), rows)
    }

    /// Verifies block-completeness and returns the spine head: the single
    /// pending block every non-empty complete state carries at its coarsest
    /// level. A pending block anywhere below that is a dangling partial
    /// block and makes the state unmergeable.
    fn spine_head(&self) -> Result<Option<(usize, f64)>, StateError> {
        let mut head = None;
        for (k, level) in self.levels.iter().enumerate() {
            if let Some(block) = level.pending() {
                if k + 1 == self.levels.len() {
                    head = Some((k, block));
                } else {
                    return Err(StateError::DanglingBlock { level: k });
                }
            }
        }
        Ok(head)
    }

    /// Combines two independently accumulated observables.
    ///
    /// Both operands must be block-complete: their total counts are zero or
    /// an exact power of two, so no partial block is dangling below the
    /// coarsest level. Per level, counts add and statistics combine with the
    /// pooled (parallel Welford) formula; the operands' coarsest pending
    /// blocks then pair exactly as ingestion would have paired them. For
    /// equal-size operands the result matches ingesting the concatenated
    /// raw stream.
    ///
    /// Fails with [`StateError::DanglingBlock`] instead of approximating
    /// when an operand holds a partial block.
    pub fn merge(&self, other: &Self) -> Result<Self, StateError> {
        let head_a = self.spine_head()?;
        let head_b = other.spine_head()?;

        if self.total_count == 0 {
            return Ok(other.clone());
        }
        if other.total_count == 0 {
            return Ok(self.clone());
        }

        let depth = self.levels.len().max(other.levels.len());
        let mut levels = Vec::with_capacity(depth + 1);
        for k in 0..depth {
            let pooled = match (self.levels.get(k), other.levels.get(k)) {
                (Some(a), Some(b)) => Level::pooled(a, b),
                (Some(a), None) => a.stats_only(),
                (None, Some(b)) => b.stats_only(),
                (None, None) => Level::new(),
            };
            levels.push(pooled);
        }

        let mut merged = Self {
            levels,
            total_count: self.total_count + other.total_count,
        };
        match (head_a, head_b) {
            (Some((ka, a)), Some((kb, b))) if ka == kb => {
                let carry = 0.5 * (a + b);
                let mut top = Level::new();
                top.record(carry);
                top.park(carry);
                merged.levels.push(top);
            }
            (head_a, head_b) => {
                for (k, block) in [head_a, head_b].into_iter().flatten() {
                    merged.levels[k].park(block);
                }
            }
        }
        Ok(merged)
    }
}

impl Extend<f64> for BlockedObservable {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for x in iter {
            self.add_measurement(x);
        }
    }
}

impl FromIterator<f64> for BlockedObservable {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut obs = BlockedObservable::new();
        obs.extend(iter);
        obs
    }
}
