use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;

/// Statistics of all completed blocks of one size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRow {
    pub mean: f64,
    pub error_bar: f64,
    pub num_blocks: u64,
}

impl Display for BlockRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "mean={:.6}, err={:.6}, blocks={}",
            self.mean, self.error_bar, self.num_blocks
        )
    }
}

pub enum ReportFormat {
    Csv,
    Tsv,
    Json,
}

/// Snapshot of a blocking analysis: one row per hierarchy level, finest
/// blocks first, plus the headline mean and error bar the observable
/// reported when the snapshot was taken.
#[derive(Debug, Clone)]
pub struct BlockReport {
    mean: f64,
    error_bar: f64,
    rows: Vec<BlockRow>,
}

impl BlockReport {
    pub(crate) fn new(mean: f64, error_bar: f64, rows: Vec<BlockRow>) -> Self {
        Self {
            mean,
            error_bar,
            rows,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn error_bar(&self) -> f64 {
        self.error_bar
    }

    pub fn rows(&self) -> &[BlockRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn export<P: AsRef<Path>>(&self, path: P, fmt: ReportFormat) -> Result<(), Error> {
        match fmt {
            ReportFormat::Csv => self.export_with_delimiter(path, ','),
            ReportFormat::Tsv => self.export_with_delimiter(path, '\t'),
            ReportFormat::Json => self.export_json(path),
        }
    }

    fn export_with_delimiter<P: AsRef<Path>>(&self, path: P, delimiter: char) -> Result<(), Error> {
        let mut w = File::create(path)?;
        writeln!(
            w,
            "level{d}block_size{d}mean{d}error_bar{d}num_blocks",
            d = delimiter
        )?;
        for (k, row) in self.rows.iter().enumerate() {
            writeln!(
                w,
                "{}{d}{}{d}{:.12}{d}{:.12}{d}{}",
                k,
                1u64 << k,
                row.mean,
                row.error_bar,
                row.num_blocks,
                d = delimiter
            )?;
        }
        Ok(())
    }

    fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut w = File::create(path)?;
        writeln!(w, "[")?;
        for (k, row) in self.rows.iter().enumerate() {
            writeln!(
                w,
                "  {{\"level\":{},\"block_size\":{},\"mean\":{},\"error_bar\":{},\"num_blocks\":{}}}{}",
                k,
                1u64 << k,
                json_number(row.mean),
                json_number(row.error_bar),
                row.num_blocks,
                if k + 1 == self.rows.len() { "" } else { "," }
            )?;
        }
        writeln!(w, "]")?;
        Ok(())
    }
}

/// JSON has no NaN or infinity; undefined statistics become `null`.
fn json_number(x: f64) -> String {
    if x.is_finite() {
        format!("{x}")
    } else {
        "null".to_string()
    }
}

impl Display for BlockReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "mean {:.6} +/- {:.6}", self.mean, self.error_bar)?;
        for (k, row) in self.rows.iter().enumerate() {
            writeln!(f, "  [{}] {}", 1u64 << k, row)?;
        }
        Ok(())
    }
}
