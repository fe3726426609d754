use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::{
    database::store::CatalogStore,
    dto::import_dto::{ImportFile, ImportFiles, ImportResponse},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/take-data",
    request_body(
        content = String,
        description = "Multipart form with `area`, `job_category`, `employees` and `vacancy` CSV files",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Files processed successfully"),
        (status = 400, description = "A required file is missing"),
        (status = 500, description = "Import failed and was rolled back")
    )
)]
pub async fn take_data<S>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse>
where
    S: CatalogStore + Clone + 'static,
{
    let mut files = ImportFiles::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(file) = field.name().and_then(ImportFile::from_field_name) else {
            continue;
        };
        let data = field.bytes().await?;
        info!(file = %file, bytes = data.len(), "Received upload");
        files.insert(file, data);
    }

    if state.require_all_files {
        let missing = files.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|file| file.field_name()).collect();
            return Err(Error::BadRequest(format!(
                "All 4 files are required, missing: {}",
                names.join(", ")
            )));
        }
    }

    match state.import_service.import_all(files).await {
        Ok(stats) => {
            info!(?stats, "Import statistics");
            Ok((
                StatusCode::OK,
                Json(ImportResponse {
                    message: "Files processed successfully".to_string(),
                    stats,
                }),
            ))
        }
        Err(err) => {
            error!("Failed to process files: {}", err);
            Err(Error::Internal(format!("Failed to process files: {}", err)))
        }
    }
}
