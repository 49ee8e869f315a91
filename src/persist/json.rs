//! JSON backend for observable persistence, layered on
//! [`ObservableRecord`]; the accumulator never sees the file format.

use std::fs;
use std::path::Path;

use crate::error::FormatError;
use crate::observable::BlockedObservable;
use crate::persist::record::ObservableRecord;

pub fn to_json_string(obs: &BlockedObservable) -> Result<String, FormatError> {
    Ok(serde_json::to_string(&ObservableRecord::from(obs))?)
}

pub fn from_json_str(json: &str) -> Result<BlockedObservable, FormatError> {
    let record: ObservableRecord = serde_json::from_str(json)?;
    record.into_observable()
}

pub fn write_json<P: AsRef<Path>>(obs: &BlockedObservable, path: P) -> Result<(), FormatError> {
    fs::write(path, to_json_string(obs)?)?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<BlockedObservable, FormatError> {
    from_json_str(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn assert_bitwise_equivalent(a: &BlockedObservable, b: &BlockedObservable) {
        assert_eq!(a.total_count(), b.total_count());
        assert_eq!(a.mean().to_bits(), b.mean().to_bits());
        assert_eq!(a.error_bar().to_bits(), b.error_bar().to_bits());
        let ra = a.block_report();
        let rb = b.block_report();
        assert_eq!(ra.len(), rb.len());
        for (x, y) in ra.rows().iter().zip(rb.rows()) {
            assert_eq!(x.num_blocks, y.num_blocks);
            assert_eq!(x.mean.to_bits(), y.mean.to_bits());
            assert_eq!(x.error_bar.to_bits(), y.error_bar.to_bits());
        }
    }

    #[test]
    fn round_trip_of_a_mid_block_state() {
        // 100 samples leave pending blocks at several levels.
        let obs: BlockedObservable = (0..100).map(|i| (i as f64).sin()).collect();
        let restored = from_json_str(&to_json_string(&obs).unwrap()).unwrap();
        assert_bitwise_equivalent(&obs, &restored);

        // The restored instance must continue the series exactly.
        let mut obs = obs;
        let mut restored = restored;
        for i in 100..128 {
            obs.add_measurement((i as f64).sin());
            restored.add_measurement((i as f64).sin());
        }
        assert_bitwise_equivalent(&obs, &restored);
    }

    #[test]
    fn round_trip_of_a_poisoned_state() {
        let mut obs = BlockedObservable::new();
        obs.add_measurement(1.0);
        obs.add_measurement(f64::NAN);
        obs.add_measurement(3.0);
        let restored = from_json_str(&to_json_string(&obs).unwrap()).unwrap();
        assert!(restored.mean().is_nan());
        assert_bitwise_equivalent(&obs, &restored);
    }

    #[test]
    fn round_trip_of_the_empty_state() {
        let restored =
            from_json_str(&to_json_string(&BlockedObservable::new()).unwrap()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn file_round_trip() {
        let obs: BlockedObservable = (0..33).map(|i| i as f64 * 0.25).collect();
        let tf = NamedTempFile::new().unwrap();
        write_json(&obs, tf.path()).unwrap();
        let restored = read_json(tf.path()).unwrap();
        assert_bitwise_equivalent(&obs, &restored);
    }

    #[test]
    fn truncated_json_is_a_parse_error() {
        assert!(matches!(
            from_json_str("{\"version\":1,\"total_count\":4"),
            Err(FormatError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(read_json(&path), Err(FormatError::Io(_))));
    }
}
