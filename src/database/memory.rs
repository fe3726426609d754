//! In-process catalog store.
//!
//! A transaction works on a private copy of the catalog and swaps it in on
//! commit, so an import that fails half way leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::database::store::{CatalogStore, CatalogTx, CatalogWriter};
use crate::error::{Error, Result};
use crate::models::catalog::{CatalogEntity, Currency, Upserted, Vocabulary};
use crate::models::vacancy::{Vacancy, VacancyUpsert};
use crate::utils::time;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredVacancy {
    pub record: VacancyUpsert,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub areas: BTreeMap<i64, String>,
    pub job_categories: BTreeMap<i64, String>,
    pub employers: BTreeMap<i64, String>,
    pub employment_types: BTreeMap<String, i64>,
    pub experience_types: BTreeMap<String, i64>,
    pub currencies: BTreeMap<String, Currency>,
    pub vacancies: BTreeMap<i64, StoredVacancy>,
    last_id: i64,
}

impl CatalogSnapshot {
    pub fn named(&self, entity: CatalogEntity) -> &BTreeMap<i64, String> {
        match entity {
            CatalogEntity::Area => &self.areas,
            CatalogEntity::JobCategory => &self.job_categories,
            CatalogEntity::Employer => &self.employers,
        }
    }

    fn named_mut(&mut self, entity: CatalogEntity) -> &mut BTreeMap<i64, String> {
        match entity {
            CatalogEntity::Area => &mut self.areas,
            CatalogEntity::JobCategory => &mut self.job_categories,
            CatalogEntity::Employer => &mut self.employers,
        }
    }

    pub fn terms(&self, vocabulary: Vocabulary) -> &BTreeMap<String, i64> {
        match vocabulary {
            Vocabulary::EmploymentType => &self.employment_types,
            Vocabulary::ExperienceType => &self.experience_types,
        }
    }

    fn terms_mut(&mut self, vocabulary: Vocabulary) -> &mut BTreeMap<String, i64> {
        match vocabulary {
            Vocabulary::EmploymentType => &mut self.employment_types,
            Vocabulary::ExperienceType => &mut self.experience_types,
        }
    }

    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn term_name(&self, vocabulary: Vocabulary, id: i64) -> Option<&str> {
        self.terms(vocabulary)
            .iter()
            .find(|(_, term_id)| **term_id == id)
            .map(|(name, _)| name.as_str())
    }

    fn vacancy_view(&self, stored: &StoredVacancy) -> Result<Vacancy> {
        let record = &stored.record;
        let currency_code = self
            .currencies
            .values()
            .find(|currency| currency.id == record.currency_id)
            .map(|currency| currency.code.clone())
            .ok_or_else(|| dangling("currency", record.currency_id))?;
        let employment_type = self
            .term_name(Vocabulary::EmploymentType, record.employment_type_id)
            .ok_or_else(|| dangling("employment type", record.employment_type_id))?;
        let experience_type = self
            .term_name(Vocabulary::ExperienceType, record.experience_type_id)
            .ok_or_else(|| dangling("experience type", record.experience_type_id))?;

        Ok(Vacancy {
            vacancy_id: record.vacancy_id,
            title: record.title.clone(),
            job_category_id: record.job_category_id,
            area_id: record.area_id,
            employer_id: record.employer_id,
            lower_salary: record.lower_salary,
            upper_salary: record.upper_salary,
            currency_code,
            employment_type: employment_type.to_string(),
            experience_type: experience_type.to_string(),
            published_at: stored.published_at,
            archived: record.archived,
        })
    }
}

fn dangling(what: &str, id: i64) -> Error {
    Error::Internal(format!("vacancy references missing {} {}", what, id))
}

#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    committed: Arc<Mutex<CatalogSnapshot>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.committed.lock().await.clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    type Tx = MemoryCatalogTx;

    async fn begin(&self) -> Result<MemoryCatalogTx> {
        let working = self.committed.lock().await.clone();
        Ok(MemoryCatalogTx {
            committed: Arc::clone(&self.committed),
            working,
        })
    }
}

pub struct MemoryCatalogTx {
    committed: Arc<Mutex<CatalogSnapshot>>,
    working: CatalogSnapshot,
}

#[async_trait]
impl CatalogWriter for MemoryCatalogTx {
    async fn upsert_named(
        &mut self,
        entity: CatalogEntity,
        id: i64,
        name: &str,
    ) -> Result<Upserted> {
        let previous = self
            .working
            .named_mut(entity)
            .insert(id, name.to_string());
        Ok(Upserted::from_inserted(previous.is_none()))
    }

    async fn find_named(&mut self, entity: CatalogEntity, id: i64) -> Result<Option<String>> {
        Ok(self.working.named(entity).get(&id).cloned())
    }

    async fn get_or_create_term(&mut self, vocabulary: Vocabulary, name: &str) -> Result<i64> {
        if let Some(id) = self.working.terms(vocabulary).get(name) {
            return Ok(*id);
        }
        let id = self.working.next_id();
        self.working
            .terms_mut(vocabulary)
            .insert(name.to_string(), id);
        Ok(id)
    }

    async fn get_or_create_currency(&mut self, code: &str, name: &str) -> Result<i64> {
        if let Some(currency) = self.working.currencies.get(code) {
            return Ok(currency.id);
        }
        let id = self.working.next_id();
        self.working.currencies.insert(
            code.to_string(),
            Currency {
                id,
                code: code.to_string(),
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    async fn find_currency(&mut self, code: &str) -> Result<Option<Currency>> {
        Ok(self.working.currencies.get(code).cloned())
    }

    async fn upsert_vacancy(&mut self, vacancy: &VacancyUpsert) -> Result<Upserted> {
        let existing = self.working.vacancies.get(&vacancy.vacancy_id);
        let published_at = vacancy
            .published_at
            .or_else(|| existing.map(|stored| stored.published_at))
            .unwrap_or_else(time::now);
        let created = existing.is_none();

        self.working.vacancies.insert(
            vacancy.vacancy_id,
            StoredVacancy {
                record: vacancy.clone(),
                published_at,
            },
        );
        Ok(Upserted::from_inserted(created))
    }

    async fn find_vacancy(&mut self, vacancy_id: i64) -> Result<Option<Vacancy>> {
        self.working
            .vacancies
            .get(&vacancy_id)
            .map(|stored| self.working.vacancy_view(stored))
            .transpose()
    }
}

#[async_trait]
impl CatalogTx for MemoryCatalogTx {
    async fn commit(self) -> Result<()> {
        *self.committed.lock().await = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
