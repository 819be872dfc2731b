use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::warn;

use common::{Bar, Error, Result};

/// One data row, read positionally: `time,open,high,low,close,volume`.
#[derive(Debug, Deserialize)]
struct RawBar(f64, f64, f64, f64, f64, f64);

impl From<RawBar> for Bar {
    fn from(RawBar(time, open, high, low, close, volume): RawBar) -> Self {
        Bar {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered comma-separated bar records. The first line is a header and is
/// skipped. Reading is forward-only; reopen the file to replay it.
pub struct BarSource {
    origin: PathBuf,
    reader: csv::Reader<Box<dyn Read + Send>>,
    record: StringRecord,
    rejected: u64,
}

impl BarSource {
    /// Open a source file. A missing or unreadable file is `SourceUnavailable`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(path, file))
    }

    /// Read records from any byte stream. `origin` only labels log lines.
    pub fn from_reader<R>(origin: impl Into<PathBuf>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(Box::new(reader) as Box<dyn Read + Send>);
        Self {
            origin: origin.into(),
            reader,
            record: StringRecord::new(),
            rejected: 0,
        }
    }

    /// Next well-formed bar, or `None` once the source is exhausted.
    /// Rows that do not hold six finite numbers are logged and skipped.
    pub fn next_bar(&mut self) -> Option<Bar> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => return None,
                Ok(true) => match self.record.deserialize::<RawBar>(None) {
                    Ok(raw) => {
                        let bar = Bar::from(raw);
                        if is_finite(&bar) {
                            return Some(bar);
                        }
                        self.reject("non-finite value");
                    }
                    Err(e) => self.reject(&e.to_string()),
                },
                Err(e) if e.is_io_error() => {
                    warn!(source = %self.origin.display(), error = %e, "Bar source read failed");
                    return None;
                }
                Err(e) => self.reject(&e.to_string()),
            }
        }
    }

    /// Rows skipped so far because they could not be turned into bars.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn reject(&mut self, reason: &str) {
        self.rejected += 1;
        let line = self.record.position().map(|p| p.line()).unwrap_or_default();
        warn!(source = %self.origin.display(), line, reason, "Skipping malformed bar record");
    }
}

fn is_finite(bar: &Bar) -> bool {
    [bar.time, bar.open, bar.high, bar.low, bar.close, bar.volume]
        .iter()
        .all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &'static str) -> BarSource {
        BarSource::from_reader("inline", text.as_bytes())
    }

    #[test]
    fn skips_header_and_parses_positionally() {
        let mut src = source(
            "Timestamp,Open,High,Low,Close,Volume\n\
             1325317920,4.39,4.40,4.38,4.39,0.455\n\
             1325317980, 4.39, 4.39, 4.39, 4.39, 0\n",
        );
        let first = src.next_bar().unwrap();
        assert_eq!(first.time, 1_325_317_920.0);
        assert_eq!(first.high, 4.40);
        assert_eq!(first.low, 4.38);
        assert_eq!(first.volume, 0.455);

        let second = src.next_bar().unwrap();
        assert_eq!(second.volume, 0.0);
        assert!(src.next_bar().is_none());
        assert!(src.next_bar().is_none());
    }

    #[test]
    fn header_only_source_is_empty() {
        let mut src = source("time,open,high,low,close,volume\n");
        assert!(src.next_bar().is_none());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut src = source(
            "time,open,high,low,close,volume\n\
             1,2,3,4,5,6\n\
             oops,2,3,4,5,6\n\
             2,2,3\n\
             3,NaN,NaN,NaN,NaN,NaN\n\
             \n\
             4,2,3,4,5,6\n",
        );
        assert_eq!(src.next_bar().unwrap().time, 1.0);
        assert_eq!(src.next_bar().unwrap().time, 4.0);
        assert!(src.next_bar().is_none());
        assert_eq!(src.rejected(), 3);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = BarSource::open("/no/such/bars.csv").err().unwrap();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }
}
