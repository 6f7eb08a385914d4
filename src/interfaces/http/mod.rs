// ============================================================
// HTTP INTERFACE
// ============================================================
// Two routes: a public read of the event cache and a PIN-gated
// multipart upload. Responses carry a short status token the
// frontend switches on.

use actix_cors::Cors;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::dev::Server;
use actix_web::{get, post, web, App, HttpResponse, HttpServer};
use std::fs;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::use_cases::upload::{FileType, UploadPipeline, UploadStatus};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::AccessGate;
use crate::infrastructure::storage::EventStorage;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub pipeline: Arc<UploadPipeline>,
    pub storage: Arc<EventStorage>,
}

/// Public read of the published event list. Before the first upload
/// there is no cache; clients get an empty list, not an error.
#[get("/events")]
pub async fn get_events(data: web::Data<AppState>) -> HttpResponse {
    match data.storage.read_cache() {
        Ok(Some(bytes)) => HttpResponse::Ok()
            .content_type("application/json")
            .body(bytes),
        Ok(None) => HttpResponse::Ok()
            .content_type("application/json")
            .body("[]"),
        Err(err) => {
            error!(error = %err, "failed to read event cache");
            HttpResponse::InternalServerError().body("internal_error")
        }
    }
}

#[derive(MultipartForm)]
pub struct UploadForm {
    pub pin: Text<String>,
    #[multipart(rename = "type")]
    pub file_type: Text<String>,
    pub file: TempFile,
}

// Upload responses carry the bare status token as a plain text body;
// the frontend switches on the string itself.
#[post("/upload")]
pub async fn upload_file(
    data: web::Data<AppState>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> HttpResponse {
    if !data.gate.verify(&form.pin) {
        warn!("upload rejected: wrong pin");
        return HttpResponse::Unauthorized().body("wrong_pin");
    }

    let file_type = match FileType::parse(&form.file_type) {
        Some(ft) => ft,
        None => {
            warn!(file_type = %*form.file_type, "upload rejected: unknown file type");
            return HttpResponse::BadRequest().body("unknown_type");
        }
    };

    let payload = match fs::read(form.file.file.path()) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(error = %err, "failed to read uploaded file");
            return HttpResponse::InternalServerError().body("internal_error");
        }
    };

    match data.pipeline.ingest(file_type, &payload) {
        Ok(UploadStatus::Uploaded { events }) => {
            info!(events, "upload accepted");
            HttpResponse::Ok().body("file_uploaded")
        }
        Ok(UploadStatus::NoEvents) => HttpResponse::Unauthorized().body("no_events"),
        Ok(UploadStatus::NotEnoughEvents) => {
            HttpResponse::Unauthorized().body("not_enough_events")
        }
        Err(err) => {
            error!(error = %err, "upload processing failed");
            HttpResponse::InternalServerError().body("internal_error")
        }
    }
}

pub fn start_server(config: &AppConfig, state: AppState) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(state.clone()))
            .service(get_events)
            .service(upload_file)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    info!(host = %config.host, port = config.port, "server listening");
    Ok(server)
}
