use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four uploads an import understands, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFile {
    Area,
    JobCategory,
    Employees,
    Vacancy,
}

impl ImportFile {
    pub const ALL: [ImportFile; 4] = [
        ImportFile::Area,
        ImportFile::JobCategory,
        ImportFile::Employees,
        ImportFile::Vacancy,
    ];

    /// Multipart field name carrying this file.
    pub fn field_name(self) -> &'static str {
        match self {
            ImportFile::Area => "area",
            ImportFile::JobCategory => "job_category",
            ImportFile::Employees => "employees",
            ImportFile::Vacancy => "vacancy",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|file| file.field_name() == name)
    }
}

impl fmt::Display for ImportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Raw uploads, fully buffered. Any of them may be absent.
#[derive(Debug, Clone, Default)]
pub struct ImportFiles {
    pub area: Option<Bytes>,
    pub job_category: Option<Bytes>,
    pub employees: Option<Bytes>,
    pub vacancy: Option<Bytes>,
}

impl ImportFiles {
    pub fn insert(&mut self, file: ImportFile, data: impl Into<Bytes>) {
        let slot = match file {
            ImportFile::Area => &mut self.area,
            ImportFile::JobCategory => &mut self.job_category,
            ImportFile::Employees => &mut self.employees,
            ImportFile::Vacancy => &mut self.vacancy,
        };
        *slot = Some(data.into());
    }

    pub fn with(mut self, file: ImportFile, data: impl Into<Bytes>) -> Self {
        self.insert(file, data);
        self
    }

    pub fn get(&self, file: ImportFile) -> Option<&Bytes> {
        match file {
            ImportFile::Area => self.area.as_ref(),
            ImportFile::JobCategory => self.job_category.as_ref(),
            ImportFile::Employees => self.employees.as_ref(),
            ImportFile::Vacancy => self.vacancy.as_ref(),
        }
    }

    pub fn missing(&self) -> Vec<ImportFile> {
        ImportFile::ALL
            .into_iter()
            .filter(|file| self.get(*file).is_none())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub file: ImportFile,
    pub line: u64,
    pub reason: String,
}

/// Outcome of one import call. A counter is present only when its file was
/// supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub areas_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employers_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancies_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub message: String,
    pub stats: ImportStats,
}
