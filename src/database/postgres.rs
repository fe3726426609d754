use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::store::{CatalogStore, CatalogTx, CatalogWriter};
use crate::error::Result;
use crate::models::catalog::{CatalogEntity, Currency, Upserted, Vocabulary};
use crate::models::vacancy::{Vacancy, VacancyUpsert};

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    type Tx = PgCatalogTx;

    async fn begin(&self) -> Result<PgCatalogTx> {
        let tx = self.pool.begin().await?;
        Ok(PgCatalogTx { tx })
    }
}

pub struct PgCatalogTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogWriter for PgCatalogTx {
    async fn upsert_named(
        &mut self,
        entity: CatalogEntity,
        id: i64,
        name: &str,
    ) -> Result<Upserted> {
        // xmax is zero only for a freshly inserted tuple.
        let sql = format!(
            r#"
            INSERT INTO {table} (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
            table = entity.table()
        );
        let inserted: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(Upserted::from_inserted(inserted))
    }

    async fn find_named(&mut self, entity: CatalogEntity, id: i64) -> Result<Option<String>> {
        let sql = format!("SELECT name FROM {} WHERE id = $1", entity.table());
        let name = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(name)
    }

    async fn get_or_create_term(&mut self, vocabulary: Vocabulary, name: &str) -> Result<i64> {
        let sql = format!(
            r#"
            INSERT INTO {table} (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
            table = vocabulary.table()
        );
        let id = sqlx::query_scalar(&sql)
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(id)
    }

    async fn get_or_create_currency(&mut self, code: &str, name: &str) -> Result<i64> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO currencies (code, name)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn find_currency(&mut self, code: &str) -> Result<Option<Currency>> {
        let currency = sqlx::query_as::<_, Currency>(
            "SELECT id, code, name FROM currencies WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(currency)
    }

    async fn upsert_vacancy(&mut self, vacancy: &VacancyUpsert) -> Result<Upserted> {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO vacancies (
                vacancy_id, title, job_category_id, area_id, employer_id,
                lower_salary, upper_salary, currency_id, employment_type_id,
                experience_type_id, published_at, archived
            ) VALUES (
                $1,$2,$3,$4,$5,
                $6,$7,$8,$9,
                $10,COALESCE($11, NOW()),$12
            )
            ON CONFLICT (vacancy_id) DO UPDATE
            SET
                title = EXCLUDED.title,
                job_category_id = EXCLUDED.job_category_id,
                area_id = EXCLUDED.area_id,
                employer_id = EXCLUDED.employer_id,
                lower_salary = EXCLUDED.lower_salary,
                upper_salary = EXCLUDED.upper_salary,
                currency_id = EXCLUDED.currency_id,
                employment_type_id = EXCLUDED.employment_type_id,
                experience_type_id = EXCLUDED.experience_type_id,
                published_at = COALESCE($11, vacancies.published_at),
                archived = EXCLUDED.archived,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(vacancy.vacancy_id)
        .bind(&vacancy.title)
        .bind(vacancy.job_category_id)
        .bind(vacancy.area_id)
        .bind(vacancy.employer_id)
        .bind(vacancy.lower_salary)
        .bind(vacancy.upper_salary)
        .bind(vacancy.currency_id)
        .bind(vacancy.employment_type_id)
        .bind(vacancy.experience_type_id)
        .bind(vacancy.published_at)
        .bind(vacancy.archived)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Upserted::from_inserted(inserted))
    }

    async fn find_vacancy(&mut self, vacancy_id: i64) -> Result<Option<Vacancy>> {
        let vacancy = sqlx::query_as::<_, Vacancy>(
            r#"
            SELECT
                v.vacancy_id,
                v.title,
                v.job_category_id,
                v.area_id,
                v.employer_id,
                v.lower_salary,
                v.upper_salary,
                c.code AS currency_code,
                et.name AS employment_type,
                xt.name AS experience_type,
                v.published_at,
                v.archived
            FROM vacancies v
            JOIN currencies c ON c.id = v.currency_id
            JOIN employment_types et ON et.id = v.employment_type_id
            JOIN experience_types xt ON xt.id = v.experience_type_id
            WHERE v.vacancy_id = $1
            "#,
        )
        .bind(vacancy_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(vacancy)
    }
}

#[async_trait]
impl CatalogTx for PgCatalogTx {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
