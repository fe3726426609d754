pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::database::postgres::PgCatalogStore;
use crate::database::store::CatalogStore;
use crate::error::Result;
use crate::services::{
    csv_service::RowParser, encoding_service::EncodingResolver, import_service::ImportService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState<S = PgCatalogStore> {
    pub import_service: ImportService<S>,
    pub require_all_files: bool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Result<Self> {
        let config = crate::config::get_config();
        let resolver = EncodingResolver::from_config(config)?;

        Ok(Self::with_store(
            PgCatalogStore::new(pool),
            resolver,
            config.import_require_all_files,
        ))
    }
}

impl<S: CatalogStore> AppState<S> {
    pub fn with_store(store: S, resolver: EncodingResolver, require_all_files: bool) -> Self {
        Self {
            import_service: ImportService::new(store, resolver, RowParser::default()),
            require_all_files,
        }
    }
}
