use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{download, files, upload};
use crate::state::AppState;

/// JSON API, mounted under `/api`.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    // Only the multipart route streams its body; JSON keeps axum's default limit.
    let multipart = OpenApiRouter::new()
        .routes(routes!(upload::upload_file))
        .layer(upload::upload_body_limit(config.storage.max_file_size));

    let uploads = OpenApiRouter::new()
        .routes(routes!(upload::upload_from_url))
        .merge(multipart);

    let files = OpenApiRouter::new()
        .routes(routes!(files::list_files))
        .routes(routes!(files::get_file, files::delete_file));

    uploads.merge(files)
}

/// Public download links, mounted at the root.
pub fn download_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(download::download_file))
}
