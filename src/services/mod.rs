pub mod catalog_service;
pub mod csv_service;
pub mod encoding_service;
pub mod import_service;
pub mod report;
pub mod vacancy_import_service;
