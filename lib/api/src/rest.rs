use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpResponse, HttpServer, Result as ActixResult};
use epicsum_core::{
    ContentType, Error, LookupOutcome, LookupRequest, MediaRecord, RequestedIndex, Stage,
};
use epicsum_storage::MediaStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SERVICE_NAME: &str = "EpicSum Media Service";

/// Raw query parameters; parsed leniently by [`LookupParams::resolve`]
#[derive(Debug, Deserialize)]
struct LookupParams {
    index: Option<String>,
    size: Option<String>,
    redirect: Option<String>,
}

#[derive(Debug)]
struct ResolvedParams {
    index: Option<RequestedIndex>,
    size: Option<i64>,
    redirect: bool,
}

impl LookupParams {
    fn resolve(self) -> Result<ResolvedParams, String> {
        let size = match self.size {
            None => None,
            Some(raw) => Some(parse_size(&raw).ok_or_else(|| format!("invalid size '{}'", raw))?),
        };
        let redirect = match self.redirect {
            None => true,
            Some(raw) => parse_flag(&raw).ok_or_else(|| format!("invalid redirect flag '{}'", raw))?,
        };
        Ok(ResolvedParams {
            // non-integer indices select the first match, like a bad legacy suffix
            index: self.index.as_deref().map(RequestedIndex::parse_or_zero),
            size,
            redirect,
        })
    }
}

/// Integer of any magnitude; values beyond `i64` saturate, which snaps to
/// the smallest or largest supported size either way
fn parse_size(text: &str) -> Option<i64> {
    let parsed = RequestedIndex::parse(text)?;
    Some(parsed.as_i64().unwrap_or(if parsed.is_negative() { i64::MIN } else { i64::MAX }))
}

/// Boolean spellings accepted for query flags
fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Serialize)]
struct LookupResponse<'a> {
    success: bool,
    query: &'a str,
    requested_index: &'a RequestedIndex,
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    total_matches: usize,
    stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    result: &'a MediaRecord,
}

impl<'a> From<&'a LookupOutcome> for LookupResponse<'a> {
    fn from(outcome: &'a LookupOutcome) -> Self {
        Self {
            success: true,
            query: &outcome.query,
            requested_index: &outcome.requested_index,
            index: outcome.index,
            size: outcome.size,
            total_matches: outcome.total_matches,
            stage: outcome.stage,
            score: outcome.score,
            result: &outcome.record,
        }
    }
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        store: Arc<MediaStore>,
        host: &str,
        port: u16,
        workers: Option<usize>,
    ) -> std::io::Result<()> {
        let mut server = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(store.clone()))
                .configure(configure)
        });
        if let Some(workers) = workers {
            server = server.workers(workers);
        }
        server.bind((host, port))?.run().await
    }
}

/// Register every route; expects `web::Data<Arc<MediaStore>>` in app data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(service_info))
        .route("/health", web::get().to(health_check))
        .route("/epicsum/media/image/{description:.*}", web::get().to(get_image))
        .route("/epicsum/media/video/{description:.*}", web::get().to(get_video));
}

async fn service_info(store: web::Data<Arc<MediaStore>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "strategy": store.status().strategy,
        "endpoints": {
            "images": "/epicsum/media/image/{description}",
            "videos": "/epicsum/media/video/{description}",
            "with_index": "/epicsum/media/image/{description}___<index>"
        },
        "database_stats": store.stats(),
    })))
}

async fn health_check(store: web::Data<Arc<MediaStore>>) -> ActixResult<HttpResponse> {
    let status = store.status();
    let body = serde_json::json!({
        "status": if status.is_ready() { "healthy" } else { "degraded" },
        "catalog_loaded": status.catalog_loaded,
        "embeddings_loaded": status.embeddings_loaded,
        "embedder_loaded": status.embedder_loaded,
        "strategy": status.strategy,
        "model_name": status.model_name,
        "loaded_at": status.loaded_at,
        "total_items": store.stats().total_items,
    });
    Ok(HttpResponse::Ok().json(body))
}

async fn get_image(
    store: web::Data<Arc<MediaStore>>,
    path: web::Path<String>,
    params: web::Query<LookupParams>,
) -> ActixResult<HttpResponse> {
    lookup_media(store, ContentType::Image, path.into_inner(), params.into_inner()).await
}

async fn get_video(
    store: web::Data<Arc<MediaStore>>,
    path: web::Path<String>,
    params: web::Query<LookupParams>,
) -> ActixResult<HttpResponse> {
    // videos have no size
    let params = LookupParams {
        size: None,
        ..params.into_inner()
    };
    lookup_media(store, ContentType::Video, path.into_inner(), params).await
}

async fn lookup_media(
    store: web::Data<Arc<MediaStore>>,
    content_type: ContentType,
    description: String,
    params: LookupParams,
) -> ActixResult<HttpResponse> {
    let params = match params.resolve() {
        Ok(params) => params,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": message
            })))
        }
    };
    let store = store.get_ref().clone();
    let (index, size) = (params.index, params.size);

    // scoring and query embedding are CPU-bound
    let outcome = web::block(move || {
        let request = LookupRequest {
            description: &description,
            index,
            size,
        };
        store.lookup(content_type, &request)
    })
    .await;

    let outcome = match outcome {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => return Ok(error_response(&e)),
        Err(e) => {
            tracing::error!("Lookup task failed: {}", e);
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "lookup task failed"
            })));
        }
    };

    if params.redirect {
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, outcome.record.link.as_str()))
            .finish());
    }
    Ok(HttpResponse::Ok().json(LookupResponse::from(&outcome)))
}

fn error_response(error: &Error) -> HttpResponse {
    let body = serde_json::json!({
        "success": false,
        "error": error.to_string()
    });
    match error {
        Error::NotFound(_) => HttpResponse::NotFound().json(body),
        other => {
            tracing::error!("Lookup failed: {}", other);
            HttpResponse::InternalServerError().json(body)
        }
    }
}
