use actix_web::{HttpResponse, http, web};
use serde_json::json;

use crate::error::ServerResult;
use crate::filters::SearchFilters;
use crate::pagination::PageRequest;
use crate::service::CatalogService;

type Pairs = web::Query<Vec<(String, String)>>;

macro_rules! some_or_404 {
    ($res:expr) => {
        match $res {
            Some(val) => val,
            None => {
                return Ok(HttpResponse::NotFound()
                    .insert_header(cache_control_no_store())
                    .json(json!({ "error": "Artifact not found" })))
            }
        }
    };
}

fn cache_control_no_store() -> http::header::CacheControl {
    http::header::CacheControl(vec![http::header::CacheDirective::NoStore])
}

/// Last value given for `key`.
fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn page_request(service: &CatalogService, pairs: &[(String, String)]) -> PageRequest {
    service.page_request(param(pairs, "page"), param(pairs, "per_page"))
}

pub(crate) async fn list_all(service: web::Data<CatalogService>, query: Pairs) -> ServerResult {
    let request = page_request(&service, &query);
    let page = web::block(move || service.list_all(request)).await??;
    Ok(HttpResponse::Ok().json(page))
}

pub(crate) async fn get_by_id(
    service: web::Data<CatalogService>,
    path: web::Path<String>,
) -> ServerResult {
    let id = some_or_404!(path.parse::<i64>().ok());
    let record = web::block(move || service.get_by_id(id)).await??;
    Ok(HttpResponse::Ok().json(some_or_404!(record)))
}

pub(crate) async fn conservation_reports(
    service: web::Data<CatalogService>,
    path: web::Path<String>,
) -> ServerResult {
    let id = some_or_404!(path.parse::<i64>().ok());
    let reports = web::block(move || service.conservation_reports(id)).await??;
    Ok(HttpResponse::Ok().json(some_or_404!(reports)))
}

pub(crate) async fn list_by_name(
    service: web::Data<CatalogService>,
    path: web::Path<String>,
    query: Pairs,
) -> ServerResult {
    let request = page_request(&service, &query);
    let name = path.into_inner();
    let page = web::block(move || service.list_by_name(&name, request)).await??;
    Ok(HttpResponse::Ok().json(page))
}

pub(crate) async fn search(service: web::Data<CatalogService>, query: Pairs) -> ServerResult {
    let request = page_request(&service, &query);
    let filters = SearchFilters::from_pairs(query.into_inner());
    let page = web::block(move || service.search(&filters, request)).await??;
    Ok(HttpResponse::Ok().json(page))
}

pub(crate) async fn health() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .insert_header(cache_control_no_store())
        .body("OK\n")
}

/// Register the catalog routes. Expects `web::Data<CatalogService>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/artifacts", web::get().to(list_all))
        // before the reports route, so an artifact called
        // "conservation-reports" is still found by name
        .route("/artifacts/name/{name}", web::get().to(list_by_name))
        .route("/artifacts/{id}", web::get().to(get_by_id))
        .route(
            "/artifacts/{id}/conservation-reports",
            web::get().to(conservation_reports),
        )
        .route("/artifact/search", web::get().to(search))
        .route("/health", web::get().to(health));
}
