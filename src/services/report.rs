use tracing::warn;

use crate::dto::import_dto::{ImportFile, SkippedRow};
use crate::error::{Result, RowError};
use crate::models::catalog::Upserted;

/// Running tally of one file's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: ImportFile,
    pub created: u64,
    pub updated: u64,
    pub skipped: Vec<SkippedRow>,
}

impl FileReport {
    pub fn new(file: ImportFile) -> Self {
        Self {
            file,
            created: 0,
            updated: 0,
            skipped: Vec::new(),
        }
    }

    /// Folds one row outcome in. Store failures are handed back to the caller
    /// untouched; every other row error is logged and recorded as skipped.
    pub fn record(
        &mut self,
        line: u64,
        outcome: std::result::Result<Upserted, RowError>,
    ) -> Result<()> {
        match outcome {
            Ok(Upserted::Created) => self.created += 1,
            Ok(Upserted::Updated) => self.updated += 1,
            Err(RowError::Store(err)) => return Err(err),
            Err(reason) => {
                warn!(file = %self.file, line, %reason, "Skipping row");
                self.skipped.push(SkippedRow {
                    file: self.file,
                    line,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn tallies_outcomes_and_rethrows_store_errors() {
        let mut report = FileReport::new(ImportFile::Area);
        report.record(2, Ok(Upserted::Created)).unwrap();
        report.record(3, Ok(Upserted::Updated)).unwrap();
        report
            .record(4, Err(RowError::MissingField("area_nm".into())))
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 4);

        let fatal = report.record(5, Err(RowError::Store(Error::Internal("boom".into()))));
        assert!(matches!(fatal, Err(Error::Internal(msg)) if msg == "boom"));
        assert_eq!(report.skipped.len(), 1);
    }
}
