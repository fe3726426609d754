#![allow(dead_code)]

use vacancy_importer::database::memory::MemoryCatalogStore;
use vacancy_importer::dto::import_dto::{ImportFile, ImportFiles};
use vacancy_importer::services::{
    csv_service::RowParser, encoding_service::EncodingResolver, import_service::ImportService,
};

pub const AREAS: &str = "area_id,area_nm\n1,Moscow\n2,Saint Petersburg\n";

pub const JOB_CATEGORIES: &str = "job_category_id,job_category_nm\n10,IT\n11,Sales\n";

pub const EMPLOYERS: &str = "employer_id,employer_nm\n100,Yandex\n101,Sber\n";

pub const VACANCIES: &str = "vacancy_id,job_title_nm,job_category_id,area_id,employer_id,\
employment_type_name,experience_type_name,salary_currency_code,\
lower_bound_salary_amt,upper_bound_salary_amt,vacancy_archive_flg\n\
1000,Rust developer,10,1,100,Full-time,3–6 years,rub,150000,250000,false\n\
1001,Account manager,11,2,101,,,USD,2000.5,,true\n\
1002,Ghost,10,99,100,,,RUB,,,false\n";

pub fn service(store: MemoryCatalogStore) -> ImportService<MemoryCatalogStore> {
    ImportService::new(store, EncodingResolver::default(), RowParser::default())
}

pub fn all_files() -> ImportFiles {
    ImportFiles::default()
        .with(ImportFile::Area, AREAS)
        .with(ImportFile::JobCategory, JOB_CATEGORIES)
        .with(ImportFile::Employees, EMPLOYERS)
        .with(ImportFile::Vacancy, VACANCIES)
}
