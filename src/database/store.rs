//! Repository interface the import pipeline writes through.
//!
//! Every import runs inside one transaction obtained from [`CatalogStore::begin`].
//! Nothing written through a [`CatalogWriter`] is visible outside the
//! transaction until [`CatalogTx::commit`] succeeds.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::catalog::{CatalogEntity, Currency, Upserted, Vocabulary};
use crate::models::vacancy::{Vacancy, VacancyUpsert};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogWriter: Send {
    /// Creates the record with `id` or overwrites its name.
    async fn upsert_named(&mut self, entity: CatalogEntity, id: i64, name: &str)
        -> Result<Upserted>;

    async fn find_named(&mut self, entity: CatalogEntity, id: i64) -> Result<Option<String>>;

    /// Returns the id of the term called `name`, inserting it when unknown.
    async fn get_or_create_term(&mut self, vocabulary: Vocabulary, name: &str) -> Result<i64>;

    /// Returns the id of the currency with `code`. `name` is only used when
    /// the currency has to be created.
    async fn get_or_create_currency(&mut self, code: &str, name: &str) -> Result<i64>;

    async fn find_currency(&mut self, code: &str) -> Result<Option<Currency>>;

    async fn upsert_vacancy(&mut self, vacancy: &VacancyUpsert) -> Result<Upserted>;

    async fn find_vacancy(&mut self, vacancy_id: i64) -> Result<Option<Vacancy>>;
}

#[async_trait]
pub trait CatalogTx: CatalogWriter + Sized {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    type Tx: CatalogTx;

    async fn begin(&self) -> Result<Self::Tx>;
}
