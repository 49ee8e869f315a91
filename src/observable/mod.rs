mod blocked;
pub(crate) mod level;
mod report;

pub use blocked::{BlockedObservable, ERROR_BAR_MIN_BLOCKS};
pub use report::{BlockReport, BlockRow, ReportFormat};
