use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::observable::BlockedObservable;
use crate::observable::level::Level;

/// Version tag embedded in every persisted record. Readers reject anything
/// else; a half-understood record must never be rebuilt into an accumulator.
pub const FORMAT_VERSION: u32 = 1;

/// Flat persisted form of one hierarchy level.
///
/// `pending_value` is meaningful only when `pending_flag` is set and is
/// written as `0.0` otherwise; an `Option` would tie the on-disk layout to
/// one serialization framework's encoding of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub count: u64,
    #[serde(with = "crate::persist::bits")]
    pub running_mean: f64,
    #[serde(with = "crate::persist::bits")]
    pub running_m2: f64,
    pub pending_flag: bool,
    #[serde(with = "crate::persist::bits")]
    pub pending_value: f64,
}

/// Complete persisted state of a [`BlockedObservable`].
///
/// This record is the stable boundary between the accumulator and any
/// storage backend; backends map it to their native container and never
/// touch the accumulator itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableRecord {
    pub version: u32,
    pub total_count: u64,
    pub levels: Vec<LevelRecord>,
}

impl From<&BlockedObservable> for ObservableRecord {
    fn from(obs: &BlockedObservable) -> Self {
        let levels = obs
            .levels()
            .iter()
            .map(|level| LevelRecord {
                count: level.count(),
                running_mean: level.raw_mean(),
                running_m2: level.raw_m2(),
                pending_flag: level.pending().is_some(),
                pending_value: level.pending().unwrap_or(0.0),
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            total_count: obs.total_count(),
            levels,
        }
    }
}

impl ObservableRecord {
    /// Rebuilds the accumulator, validating the record against the
    /// structural invariants ingestion maintains. Any inconsistency fails
    /// the whole restore; there is no partial recovery.
    pub fn into_observable(self) -> Result<BlockedObservable, FormatError> {
        if self.version != FORMAT_VERSION {
            return Err(FormatError::Version {
                found: self.version,
                expected: FORMAT_VERSION,
            });
        }

        let expected_levels = if self.total_count == 0 {
            0
        } else {
            64 - self.total_count.leading_zeros() as usize
        };
        if self.levels.len() != expected_levels {
            return Err(FormatError::Corrupt(format!(
                "{} levels recorded for {} samples (expected {expected_levels})",
                self.levels.len(),
                self.total_count,
            )));
        }

        let mut levels = Vec::with_capacity(self.levels.len());
        for (k, rec) in self.levels.iter().enumerate() {
            let expected_count = self.total_count >> k;
            if rec.count != expected_count {
                return Err(FormatError::Corrupt(format!(
                    "level {k} holds {} blocks (expected {expected_count})",
                    rec.count,
                )));
            }
            if rec.pending_flag != ((self.total_count >> k) & 1 == 1) {
                return Err(FormatError::Corrupt(format!(
                    "level {k} pending flag contradicts the total count"
                )));
            }
            if !rec.pending_flag && rec.pending_value.to_bits() != 0 {
                return Err(FormatError::Corrupt(format!(
                    "level {k} carries a pending value without the flag"
                )));
            }
            let pending = rec.pending_flag.then_some(rec.pending_value);
            levels.push(Level::from_raw_parts(
                rec.count,
                rec.running_mean,
                rec.running_m2,
                pending,
            ));
        }

        Ok(BlockedObservable::from_raw_parts(levels, self.total_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_of(n: u64) -> ObservableRecord {
        let obs: BlockedObservable = (0..n).map(|i| i as f64 * 0.5).collect();
        ObservableRecord::from(&obs)
    }

    #[test]
    fn captures_every_level_field() {
        let record = record_of(6);
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.total_count, 6);
        assert_eq!(record.levels.len(), 3);
        assert_eq!(record.levels[0].count, 6);
        assert!(!record.levels[0].pending_flag);
        assert_eq!(record.levels[0].pending_value, 0.0);
        assert!(record.levels[1].pending_flag);
        assert_eq!(record.levels[2].count, 1);
    }

    #[test]
    fn record_serde_round_trip() {
        let record = record_of(100);
        let json = serde_json::to_string(&record).unwrap();
        let back: ObservableRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn restores_an_equivalent_observable() {
        let obs: BlockedObservable = (0..100).map(|i| (i as f64).cos()).collect();
        let restored = ObservableRecord::from(&obs).into_observable().unwrap();
        assert_eq!(restored.total_count(), obs.total_count());
        assert_eq!(restored.mean().to_bits(), obs.mean().to_bits());
        assert_eq!(restored.error_bar().to_bits(), obs.error_bar().to_bits());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut record = record_of(8);
        record.version = 2;
        assert!(matches!(
            record.into_observable(),
            Err(FormatError::Version {
                found: 2,
                expected: FORMAT_VERSION
            })
        ));
    }

    #[test]
    fn rejects_wrong_level_count() {
        let mut record = record_of(8);
        record.levels.pop();
        assert!(matches!(
            record.into_observable(),
            Err(FormatError::Corrupt(_))
        ));
    }

    #[test]
    fn rejects_tampered_block_count() {
        let mut record = record_of(8);
        record.levels[1].count += 1;
        assert!(matches!(
            record.into_observable(),
            Err(FormatError::Corrupt(_))
        ));
    }

    #[test]
    fn rejects_contradictory_pending_flag() {
        let mut record = record_of(8);
        record.levels[0].pending_flag = true;
        assert!(matches!(
            record.into_observable(),
            Err(FormatError::Corrupt(_))
        ));
    }

    #[test]
    fn rejects_payload_without_pending_flag() {
        let mut record = record_of(8);
        record.levels[0].pending_value = 1.0;
        assert!(matches!(
            record.into_observable(),
            Err(FormatError::Corrupt(_))
        ));
    }
}
