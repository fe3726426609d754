use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored vacancy with its vocabulary references resolved to their names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vacancy {
    pub vacancy_id: i64,
    pub title: String,
    pub job_category_id: i64,
    pub area_id: i64,
    pub employer_id: i64,
    pub lower_salary: Option<Decimal>,
    pub upper_salary: Option<Decimal>,
    pub currency_code: String,
    pub employment_type: String,
    pub experience_type: String,
    pub published_at: DateTime<Utc>,
    pub archived: bool,
}

impl Vacancy {
    pub fn salary_range(&self) -> String {
        match (self.lower_salary, self.upper_salary) {
            (Some(lower), Some(upper)) => {
                format!("{} - {} {}", lower, upper, self.currency_code)
            }
            (Some(lower), None) => format!("from {} {}", lower, self.currency_code),
            (None, Some(upper)) => format!("up to {} {}", upper, self.currency_code),
            (None, None) => "Not specified".to_string(),
        }
    }
}

/// Fully resolved vacancy row, ready to be written.
///
/// `published_at` of `None` means "import time" for a new vacancy and
/// "leave as is" for an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyUpsert {
    pub vacancy_id: i64,
    pub title: String,
    pub job_category_id: i64,
    pub area_id: i64,
    pub employer_id: i64,
    pub lower_salary: Option<Decimal>,
    pub upper_salary: Option<Decimal>,
    pub currency_id: i64,
    pub employment_type_id: i64,
    pub experience_type_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub archived: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacancy(lower: Option<Decimal>, upper: Option<Decimal>) -> Vacancy {
        Vacancy {
            vacancy_id: 1,
            title: "Backend developer".into(),
            job_category_id: 1,
            area_id: 1,
            employer_id: 1,
            lower_salary: lower,
            upper_salary: upper,
            currency_code: "RUB".into(),
            employment_type: "Full-time".into(),
            experience_type: "1–3 years".into(),
            published_at: Utc::now(),
            archived: false,
        }
    }

    #[test]
    fn salary_range_covers_every_bound_combination() {
        let low = Some(Decimal::new(100_000, 0));
        let high = Some(Decimal::new(150_000, 0));

        assert_eq!(vacancy(low, high).salary_range(), "100000 - 150000 RUB");
        assert_eq!(vacancy(low, None).salary_range(), "from 100000 RUB");
        assert_eq!(vacancy(None, high).salary_range(), "up to 150000 RUB");
        assert_eq!(vacancy(None, None).salary_range(), "Not specified");
    }
}
