//! Upserts for the simple id/name reference files: areas, job categories and
//! employers.

use tracing::info;

use crate::database::store::CatalogWriter;
use crate::dto::import_dto::ImportFile;
use crate::error::{Result, RowError};
use crate::models::catalog::{CatalogEntity, Upserted};
use crate::services::csv_service::Row;
use crate::services::report::FileReport;

/// Header names for one entity file. Each slice lists accepted aliases in
/// order of preference.
#[derive(Debug, Clone, Copy)]
pub struct NamedColumns {
    pub entity: CatalogEntity,
    pub file: ImportFile,
    pub id: &'static [&'static str],
    pub name: &'static [&'static str],
}

pub const AREA_COLUMNS: NamedColumns = NamedColumns {
    entity: CatalogEntity::Area,
    file: ImportFile::Area,
    id: &["area_id"],
    name: &["area_nm"],
};

pub const JOB_CATEGORY_COLUMNS: NamedColumns = NamedColumns {
    entity: CatalogEntity::JobCategory,
    file: ImportFile::JobCategory,
    id: &["job_category_id"],
    name: &["job_category_nm"],
};

pub const EMPLOYER_COLUMNS: NamedColumns = NamedColumns {
    entity: CatalogEntity::Employer,
    file: ImportFile::Employees,
    id: &["employer_id", "id"],
    name: &["employer_nm", "name"],
};

/// Column widths of the catalog schema, in characters.
pub const MAX_NAME_CHARS: usize = 300;
pub const MAX_TERM_CHARS: usize = 100;

pub fn parse_id(field: &str, value: &str) -> std::result::Result<i64, RowError> {
    value.parse().map_err(|_| RowError::InvalidInteger {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Rejects text the database would refuse: values wider than the column and
/// embedded NUL characters.
pub fn check_text<'a>(
    field: &str,
    value: &'a str,
    max_chars: usize,
) -> std::result::Result<&'a str, RowError> {
    if value.contains('\0') {
        return Err(RowError::NulCharacter {
            field: field.to_string(),
        });
    }
    if value.chars().count() > max_chars {
        return Err(RowError::TooLong {
            field: field.to_string(),
            max: max_chars,
        });
    }
    Ok(value)
}

pub async fn import_named<W, I>(
    writer: &mut W,
    columns: NamedColumns,
    rows: I,
) -> Result<FileReport>
where
    W: CatalogWriter + ?Sized,
    I: IntoIterator<Item = (u64, std::result::Result<Row, RowError>)>,
{
    let mut report = FileReport::new(columns.file);
    for (line, row) in rows {
        let outcome = match row {
            Ok(row) => upsert_row(writer, columns, &row).await,
            Err(err) => Err(err),
        };
        report.record(line, outcome)?;
    }

    info!(
        file = %columns.file,
        created = report.created,
        updated = report.updated,
        skipped = report.skipped.len(),
        "Imported {} file",
        columns.entity
    );
    Ok(report)
}

async fn upsert_row<W>(
    writer: &mut W,
    columns: NamedColumns,
    row: &Row,
) -> std::result::Result<Upserted, RowError>
where
    W: CatalogWriter + ?Sized,
{
    let raw_id = row.require_any(columns.id)?;
    let id = parse_id(columns.id[0], raw_id)?;
    let name = check_text(
        columns.name[0],
        row.require_any(columns.name)?,
        MAX_NAME_CHARS,
    )?;

    Ok(writer.upsert_named(columns.entity, id, name).await?)
}
