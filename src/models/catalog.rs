use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Reference entities keyed by an external integer id and carrying a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntity {
    Area,
    JobCategory,
    Employer,
}

impl CatalogEntity {
    pub fn table(self) -> &'static str {
        match self {
            CatalogEntity::Area => "areas",
            CatalogEntity::JobCategory => "job_categories",
            CatalogEntity::Employer => "employers",
        }
    }
}

impl fmt::Display for CatalogEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CatalogEntity::Area => "area",
            CatalogEntity::JobCategory => "job category",
            CatalogEntity::Employer => "employer",
        };
        f.write_str(label)
    }
}

/// Open dictionaries identified by their name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    EmploymentType,
    ExperienceType,
}

impl Vocabulary {
    pub fn table(self) -> &'static str {
        match self {
            Vocabulary::EmploymentType => "employment_types",
            Vocabulary::ExperienceType => "experience_types",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Result of an upsert keyed by a natural id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

impl Upserted {
    pub fn from_inserted(inserted: bool) -> Self {
        if inserted {
            Upserted::Created
        } else {
            Upserted::Updated
        }
    }
}
