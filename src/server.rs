//! HTTP delivery surface (feature `server`).
//!
//! One meaningful route: `POST /generate-book` takes `{childName, theme}`,
//! runs the full pipeline, archives the PDF to disk, and returns the bytes
//! as an attachment. Input validation (non-empty fields) lives here, not in
//! the core — the pipeline trusts its caller.
//!
//! Degraded books (placeholder pages, template ideas) are indistinguishable
//! from perfect ones at this boundary: both are a 200 with a PDF. Only fatal
//! pipeline errors become a 500, with a generic message plus detail.

use crate::config::BookConfig;
use crate::error::BookError;
use crate::generate::generate;
use crate::output::GenerationRequest;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Where the server listens and where finished books are archived.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// e.g. `"0.0.0.0:3000"`.
    pub bind_addr: String,
    /// Every generated book is also written here, timestamped.
    pub archive_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            archive_dir: PathBuf::from("book_archive"),
        }
    }
}

struct AppState {
    book_config: BookConfig,
    archive_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBookBody {
    #[serde(default)]
    child_name: String,
    #[serde(default)]
    theme: String,
}

async fn index() -> impl Responder {
    HttpResponse::Ok().body("crayonpress is up")
}

async fn generate_book(
    state: web::Data<AppState>,
    body: web::Json<GenerateBookBody>,
) -> HttpResponse {
    let child_name = body.child_name.trim();
    let theme = body.theme.trim();

    if child_name.is_empty() || theme.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "error": "childName and theme are required" }));
    }

    info!("New order: {child_name} — {theme}");
    let request = GenerationRequest::new(child_name, theme);

    let output = match generate(&request, &state.book_config).await {
        Ok(output) => output,
        Err(e) => return failure_response(e),
    };

    let file_name = archive_file_name(child_name, theme);
    if let Err(e) = archive_pdf(&state.archive_dir, &file_name, &output.pdf).await {
        // The caller still gets their book; only the local copy is lost.
        warn!("Could not archive '{file_name}': {e}");
    }

    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename={file_name}"),
        ))
        .body(output.pdf)
}

fn failure_response(e: BookError) -> HttpResponse {
    error!("Generation failed: {e}");
    HttpResponse::InternalServerError().json(json!({
        "error": "Book generation failed.",
        "details": e.to_string(),
    }))
}

async fn archive_pdf(dir: &Path, file_name: &str, pdf: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, pdf).await?;
    info!("Archived: {}", path.display());
    Ok(())
}

/// `Lily_Space_Dinosaurs_2026-08-06T14-02-31.pdf`
fn archive_file_name(child_name: &str, theme: &str) -> String {
    let ts = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
    format!(
        "{}_{}_{ts}.pdf",
        sanitize_component(child_name),
        sanitize_component(theme)
    )
}

/// Replace everything outside `[A-Za-z0-9]` so the name is safe as a path
/// component on any filesystem.
fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Run the HTTP server until shutdown.
///
/// The `BookConfig` is shared across all requests; each request builds its
/// own book state, so one config serves any number of concurrent orders.
pub async fn run_server(book_config: BookConfig, server: ServerConfig) -> std::io::Result<()> {
    info!("Listening on http://{}", server.bind_addr);
    info!("Archiving books to: {}", server.archive_dir.display());

    let state = web::Data::new(AppState {
        book_config,
        archive_dir: server.archive_dir,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .route("/generate-book", web::post().to(generate_book))
    })
    .bind(server.bind_addr)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn missing_fields_are_rejected_with_400() {
        let state = web::Data::new(AppState {
            book_config: BookConfig::default(),
            archive_dir: PathBuf::from("unused"),
        });
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/generate-book", web::post().to(generate_book)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate-book")
            .set_json(json!({ "childName": "", "theme": "Robots" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/generate-book")
            .set_json(json!({ "theme": "Robots" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sanitized_names_are_filesystem_safe() {
        assert_eq!(sanitize_component("Space Dinosaurs!"), "Space_Dinosaurs_");
        assert_eq!(sanitize_component("Ayşe"), "Ay_e");
        let name = archive_file_name("Lily", "Space Dinosaurs");
        assert!(name.starts_with("Lily_Space_Dinosaurs_"));
        assert!(name.ends_with(".pdf"));
        assert!(!name.contains(' '));
    }
}
