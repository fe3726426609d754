//! Vacancy file reconciliation.
//!
//! Each row references an area, a job category and an employer that must
//! already exist in the open transaction, and names an employment type,
//! experience type and currency that are created on first sight. A row that
//! cannot be resolved is skipped; the rest of the file carries on.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::info;

use crate::database::store::CatalogWriter;
use crate::dto::import_dto::ImportFile;
use crate::error::{Result, RowError};
use crate::models::catalog::{CatalogEntity, Upserted, Vocabulary};
use crate::models::vacancy::VacancyUpsert;
use crate::services::catalog_service::{check_text, parse_id, MAX_NAME_CHARS, MAX_TERM_CHARS};
use crate::services::csv_service::Row;
use crate::services::report::FileReport;
use crate::utils::time;

pub const DEFAULT_EMPLOYMENT_TYPE: &str = "Full-time";
pub const DEFAULT_EXPERIENCE_TYPE: &str = "1–3 years";
pub const DEFAULT_CURRENCY_CODE: &str = "RUB";

const ARCHIVED_VALUES: [&str; 3] = ["true", "1", "yes"];

pub mod columns {
    pub const VACANCY_ID: &str = "vacancy_id";
    pub const TITLE: &str = "job_title_nm";
    pub const JOB_CATEGORY_ID: &str = "job_category_id";
    pub const AREA_ID: &str = "area_id";
    pub const EMPLOYER_ID: &str = "employer_id";
    pub const EMPLOYMENT_TYPE: &str = "employment_type_name";
    pub const EXPERIENCE_TYPE: &str = "experience_type_name";
    pub const CURRENCY_CODE: &str = "salary_currency_code";
    pub const LOWER_SALARY: &str = "lower_bound_salary_amt";
    pub const UPPER_SALARY: &str = "upper_bound_salary_amt";
    pub const ARCHIVED: &str = "vacancy_archive_flg";
    pub const PUBLISHED_AT: &str = "vacancy_publish_dttm";
}

/// Display name given to a currency created on the fly.
pub fn currency_display_name(code: &str) -> &str {
    match code {
        "RUB" => "Russian ruble",
        other => other,
    }
}

/// Ids already resolved in this import, so repeated references cost one
/// round trip.
#[derive(Debug, Default)]
struct LookupCache {
    known: HashSet<(CatalogEntity, i64)>,
    terms: HashMap<(Vocabulary, String), i64>,
    currencies: HashMap<String, i64>,
}

#[derive(Debug, Default)]
pub struct VacancyReconciler {
    cache: LookupCache,
}

impl VacancyReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn import<W, I>(&mut self, writer: &mut W, rows: I) -> Result<FileReport>
    where
        W: CatalogWriter + ?Sized,
        I: IntoIterator<Item = (u64, std::result::Result<Row, RowError>)>,
    {
        let mut report = FileReport::new(ImportFile::Vacancy);
        for (line, row) in rows {
            let outcome = match row {
                Ok(row) => self.reconcile(writer, &row).await,
                Err(err) => Err(err),
            };
            report.record(line, outcome)?;
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped.len(),
            "Imported vacancy file"
        );
        Ok(report)
    }

    pub async fn reconcile<W>(
        &mut self,
        writer: &mut W,
        row: &Row,
    ) -> std::result::Result<Upserted, RowError>
    where
        W: CatalogWriter + ?Sized,
    {
        let vacancy_id = parse_id(columns::VACANCY_ID, row.require(columns::VACANCY_ID)?)?;
        let title = check_text(columns::TITLE, row.require(columns::TITLE)?, MAX_NAME_CHARS)?;

        let job_category_id = self
            .resolve_reference(writer, row, CatalogEntity::JobCategory, columns::JOB_CATEGORY_ID)
            .await?;
        let area_id = self
            .resolve_reference(writer, row, CatalogEntity::Area, columns::AREA_ID)
            .await?;
        let employer_id = self
            .resolve_reference(writer, row, CatalogEntity::Employer, columns::EMPLOYER_ID)
            .await?;

        let archived = parse_flag(row.get(columns::ARCHIVED));
        let lower_salary = parse_amount(columns::LOWER_SALARY, row.get(columns::LOWER_SALARY))?;
        let upper_salary = parse_amount(columns::UPPER_SALARY, row.get(columns::UPPER_SALARY))?;
        let currency_code =
            normalize_currency_code(row.get(columns::CURRENCY_CODE).unwrap_or(DEFAULT_CURRENCY_CODE))?;
        let published_at = row
            .get(columns::PUBLISHED_AT)
            .map(|value| {
                time::parse_timestamp(value).map_err(|_| RowError::InvalidTimestamp {
                    field: columns::PUBLISHED_AT.to_string(),
                    value: value.to_string(),
                })
            })
            .transpose()?;

        let employment_type = check_text(
            columns::EMPLOYMENT_TYPE,
            row.get(columns::EMPLOYMENT_TYPE)
                .unwrap_or(DEFAULT_EMPLOYMENT_TYPE),
            MAX_TERM_CHARS,
        )?;
        let experience_type = check_text(
            columns::EXPERIENCE_TYPE,
            row.get(columns::EXPERIENCE_TYPE)
                .unwrap_or(DEFAULT_EXPERIENCE_TYPE),
            MAX_TERM_CHARS,
        )?;

        let employment_type_id = self
            .term(writer, Vocabulary::EmploymentType, employment_type)
            .await?;
        let experience_type_id = self
            .term(writer, Vocabulary::ExperienceType, experience_type)
            .await?;
        let currency_id = self.currency(writer, &currency_code).await?;

        let vacancy = VacancyUpsert {
            vacancy_id,
            title: title.to_string(),
            job_category_id,
            area_id,
            employer_id,
            lower_salary,
            upper_salary,
            currency_id,
            employment_type_id,
            experience_type_id,
            published_at,
            archived,
        };
        Ok(writer.upsert_vacancy(&vacancy).await?)
    }

    async fn resolve_reference<W>(
        &mut self,
        writer: &mut W,
        row: &Row,
        entity: CatalogEntity,
        column: &str,
    ) -> std::result::Result<i64, RowError>
    where
        W: CatalogWriter + ?Sized,
    {
        let id = parse_id(column, row.require(column)?)?;
        if self.cache.known.contains(&(entity, id)) {
            return Ok(id);
        }
        match writer.find_named(entity, id).await? {
            Some(_) => {
                self.cache.known.insert((entity, id));
                Ok(id)
            }
            None => Err(RowError::UnknownReference { entity, id }),
        }
    }

    async fn term<W>(&mut self, writer: &mut W, vocabulary: Vocabulary, name: &str) -> Result<i64>
    where
        W: CatalogWriter + ?Sized,
    {
        let key = (vocabulary, name.to_string());
        if let Some(id) = self.cache.terms.get(&key) {
            return Ok(*id);
        }
        let id = writer.get_or_create_term(vocabulary, name).await?;
        self.cache.terms.insert(key, id);
        Ok(id)
    }

    async fn currency<W>(&mut self, writer: &mut W, code: &str) -> Result<i64>
    where
        W: CatalogWriter + ?Sized,
    {
        if let Some(id) = self.cache.currencies.get(code) {
            return Ok(*id);
        }
        let id = writer
            .get_or_create_currency(code, currency_display_name(code))
            .await?;
        self.cache.currencies.insert(code.to_string(), id);
        Ok(id)
    }
}

pub fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|value| {
            let value = value.to_lowercase();
            ARCHIVED_VALUES.contains(&value.as_str())
        })
        .unwrap_or(false)
}

/// Parses a salary bound. Blank means "not specified"; stored with two
/// decimal places in a NUMERIC(12,2) column.
pub fn parse_amount(
    field: &str,
    value: Option<&str>,
) -> std::result::Result<Option<Decimal>, RowError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let amount = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| RowError::InvalidAmount {
            field: field.to_string(),
            value: value.to_string(),
        })?
        .round_dp(2);

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RowError::NegativeAmount {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    if amount > max_amount() {
        return Err(RowError::AmountOutOfRange {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Some(amount))
}

fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

pub fn normalize_currency_code(code: &str) -> std::result::Result<String, RowError> {
    let code = code.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(RowError::InvalidCurrencyCode(code))
    }
}
