use tracing::{error, info, instrument, warn};

use crate::database::store::{CatalogStore, CatalogTx};
use crate::dto::import_dto::{ImportFile, ImportFiles, ImportStats};
use crate::error::Result;
use crate::services::catalog_service::{
    import_named, NamedColumns, AREA_COLUMNS, EMPLOYER_COLUMNS, JOB_CATEGORY_COLUMNS,
};
use crate::services::csv_service::RowParser;
use crate::services::encoding_service::EncodingResolver;
use crate::services::report::FileReport;
use crate::services::vacancy_import_service::VacancyReconciler;

/// Runs the four file stages in one transaction.
#[derive(Clone)]
pub struct ImportService<S> {
    store: S,
    resolver: EncodingResolver,
    parser: RowParser,
}

impl<S: CatalogStore> ImportService<S> {
    pub fn new(store: S, resolver: EncodingResolver, parser: RowParser) -> Self {
        Self {
            store,
            resolver,
            parser,
        }
    }

    /// Imports whichever files are present, in dependency order: areas, job
    /// categories, employers, then vacancies. Any error that escapes a stage
    /// rolls back everything written by this call.
    #[instrument(skip(self, files), fields(missing = ?files.missing()))]
    pub async fn import_all(&self, files: ImportFiles) -> Result<ImportStats> {
        let mut tx = self.store.begin().await?;

        match self.run_stages(&mut tx, &files).await {
            Ok(stats) => {
                tx.commit().await?;
                info!(?stats, "Import committed");
                Ok(stats)
            }
            Err(err) => {
                error!(error = %err, "Import failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn run_stages(&self, tx: &mut S::Tx, files: &ImportFiles) -> Result<ImportStats> {
        let mut stats = ImportStats::default();

        if let Some(report) = self.named_stage(tx, files, AREA_COLUMNS).await? {
            stats.areas_created = Some(report.created);
            stats.skipped.extend(report.skipped);
        }
        if let Some(report) = self.named_stage(tx, files, JOB_CATEGORY_COLUMNS).await? {
            stats.categories_created = Some(report.created);
            stats.skipped.extend(report.skipped);
        }
        if let Some(report) = self.named_stage(tx, files, EMPLOYER_COLUMNS).await? {
            stats.employers_created = Some(report.created);
            stats.skipped.extend(report.skipped);
        }
        if let Some(raw) = files.get(ImportFile::Vacancy) {
            let decoded = self.resolver.resolve(raw);
            let rows = self.parser.parse(&decoded.text)?;
            let report = VacancyReconciler::new().import(tx, rows).await?;
            stats.vacancies_created = Some(report.created);
            stats.skipped.extend(report.skipped);
        }

        Ok(stats)
    }

    async fn named_stage(
        &self,
        tx: &mut S::Tx,
        files: &ImportFiles,
        columns: NamedColumns,
    ) -> Result<Option<FileReport>> {
        let Some(raw) = files.get(columns.file) else {
            return Ok(None);
        };
        let decoded = self.resolver.resolve(raw);
        let rows = self.parser.parse(&decoded.text)?;
        let report = import_named(tx, columns, rows).await?;
        Ok(Some(report))
    }
}
