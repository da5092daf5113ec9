#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for protected-area patch statistics.
//!
//! Serves the dashboard's statistics endpoints under `/api/stats` from the
//! `nature_data` table in `PostgreSQL`, plus patch images from a local
//! directory under `/api/patch/image`.

pub mod config;
mod handlers;
pub mod images;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use protected_area_database::db;
use protected_area_database::relation::SqlPatchRelation;
use protected_area_stats::relation::PatchRelation;
use protected_area_stats_models::ReferenceBaseline;

use crate::config::ServerConfig;
use crate::images::ImageStore;

/// Shared application state.
pub struct AppState {
    /// Patch relation every statistics query runs against.
    pub relation: Arc<dyn PatchRelation>,
    /// Reference figures for yearly overviews.
    pub baseline: ReferenceBaseline,
    /// Patch image lookup.
    pub images: ImageStore,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
            .route("/health", web::get().to(handlers::health))
            .route("/stats/trend", web::get().to(handlers::trend))
            .route("/stats/overview", web::get().to(handlers::overview))
            .route("/stats/damage-batch", web::get().to(handlers::damage_batch))
            .route("/stats/region", web::get().to(handlers::region))
            .route(
                "/stats/protected-areas",
                web::get().to(handlers::protected_areas),
            )
            .route("/stats/spots", web::get().to(handlers::spots))
            .route("/stats/transition", web::get().to(handlers::transition))
            .route("/stats/alerts", web::get().to(handlers::alerts))
            .route("/patch/image", web::get().to(handlers::patch_image)),
    );
}

/// Starts the statistics API server.
///
/// Reads [`ServerConfig`] from the environment, connects to the database
/// and serves until shutdown. The caller provides the async runtime (e.g.
/// via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database connection fails, or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Connecting to database...");
    let db_conn = db::connect(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let images = ImageStore::new(&config.image_dir);
    log::info!("Serving patch images from {}", images.dir().display());

    let state = web::Data::new(AppState {
        relation: Arc::new(SqlPatchRelation::new(Arc::from(db_conn))),
        baseline: config.baseline,
        images,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use protected_area_patch_models::PatchRecord;
    use protected_area_stats::memory::MemoryRelation;

    use super::*;

    fn patch(id: &str, change_type: &str, area: f64, protected_type: &str) -> PatchRecord {
        PatchRecord {
            id: id.to_string(),
            change_type: change_type.to_string(),
            before_category: "耕地".to_string(),
            after_category: "建设用地".to_string(),
            area,
            protected_area_name: "白洋淀".to_string(),
            protected_type: protected_type.to_string(),
            batch: "202301".to_string(),
            year: "2023".to_string(),
            province: "河北省".to_string(),
            city: "保定市".to_string(),
            county: "安新县".to_string(),
        }
    }

    fn state(image_dir: &std::path::Path) -> web::Data<AppState> {
        let relation = MemoryRelation::new(vec![
            patch("T1", "资源损毁", 12.0, "WP"),
            patch("T2", "恢复治理", 3.0, "WP"),
            patch("T3", "资源损毁", 30.0, "NR"),
        ]);
        web::Data::new(AppState {
            relation: Arc::new(relation),
            baseline: ReferenceBaseline::default(),
            images: ImageStore::new(image_dir),
        })
    }

    async fn get(state: web::Data<AppState>, uri: &str) -> (StatusCode, Vec<u8>) {
        let app =
            test::init_service(App::new().app_data(state).configure(configure)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        (status, test::read_body(resp).await.to_vec())
    }

    async fn get_json(state: web::Data<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = get(state, uri).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn trend_returns_both_series() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, json) = get_json(state(tmp.path()), "/api/stats/trend").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["资源损毁"]["2023"], 2);
        assert_eq!(json["恢复治理"]["2023"], 1);
    }

    #[actix_web::test]
    async fn overview_requires_year() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, json) = get_json(state(tmp.path()), "/api/stats/overview").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required parameter: year");

        let (status, json) = get_json(state(tmp.path()), "/api/stats/overview?year=2023").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_count"], 3);
        assert_eq!(json["protected_count"], 1098);
    }

    #[actix_web::test]
    async fn county_drill_down_is_a_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, _) = get_json(
            state(tmp.path()),
            "/api/stats/region?year=2023&scope=county&name=%E5%AE%89%E6%96%B0%E5%8E%BF",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) =
            get_json(state(tmp.path()), "/api/stats/region?year=2023&scope=city").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["保定市"]["count"], 3);
    }

    #[actix_web::test]
    async fn protected_type_display_names_are_normalized() {
        let tmp = tempfile::tempdir().unwrap();
        // 湿地公园 (wetland park) maps to WP.
        let (status, json) = get_json(
            state(tmp.path()),
            "/api/stats/spots?year=2023&scope=province\
             &protected_type=%E6%B9%BF%E5%9C%B0%E5%85%AC%E5%9B%AD",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 2);
        assert_eq!(json["list"][0]["tbbh"], "T1");
        assert_eq!(json["list"][1]["bhdl"], "恢复治理");
    }

    #[actix_web::test]
    async fn transition_without_qlx_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, json) =
            get_json(state(tmp.path()), "/api/stats/transition?year=2023&scope=province").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required parameter: before_category");
    }

    #[actix_web::test]
    async fn alerts_are_paginated_largest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, json) = get_json(
            state(tmp.path()),
            "/api/stats/alerts?year=2023&alert_area=10&page_size=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 2);
        assert_eq!(json["pagination"]["total_pages"], 2);
        assert_eq!(json["list"][0]["tbbh"], "T3");

        let (status, _) =
            get_json(state(tmp.path()), "/api/stats/alerts?year=2023&alert_area=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn negative_page_means_the_first_page() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, json) = get_json(
            state(tmp.path()),
            "/api/stats/spots?year=2023&scope=province&page=-1&page_size=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["current_page"], 1);
        assert_eq!(json["list"][0]["tbbh"], "T1");
    }

    #[actix_web::test]
    async fn malformed_query_values_get_a_json_error() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, json) =
            get_json(state(tmp.path()), "/api/stats/alerts?year=2023&alert_area=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("Invalid parameter"));

        let (status, json) = get_json(
            state(tmp.path()),
            "/api/stats/spots?year=2023&scope=province&page_size=-3",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[actix_web::test]
    async fn missing_image_answers_with_notice() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = get(state(tmp.path()), "/api/patch/image?tbbh=T1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), handlers::NO_IMAGE);

        let (status, _) = get(state(tmp.path()), "/api/patch/image").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn existing_image_is_served() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("T1.png"), b"\x89PNG").unwrap();
        let (status, body) = get(state(tmp.path()), "/api/patch/image?tbbh=T1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"\x89PNG");
    }
}
