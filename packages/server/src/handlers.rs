//! HTTP handler functions for the statistics API.

use actix_files::NamedFile;
use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use protected_area_server_models::{
    AlertParams, ApiError, ApiHealth, ImageParams, RegionParams, StatsParams, YearParams,
};
use protected_area_stats::{StatsError, queries};
use protected_area_stats_models::{AlertQuery, StatsQuery};
use serde::Serialize;

use crate::AppState;

/// Body returned when a patch has no image.
pub const NO_IMAGE: &str = "暂无图片";

/// Maps an operation result to a JSON response.
///
/// Parameter errors are the client's fault and carry their message.
/// Query failures are logged and answered with a generic message.
fn respond<T: Serialize>(action: &str, result: Result<T, StatsError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(StatsError::QueryFailed(e)) => {
            log::error!("Failed to {action}: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: format!("Failed to {action}"),
            })
        }
        Err(e) => HttpResponse::BadRequest().json(ApiError {
            error: e.to_string(),
        }),
    }
}

/// Answers a query string that fails to deserialize with an [`ApiError`]
/// body instead of actix's plain-text default.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiError {
        error: format!("Invalid parameter: {err}"),
    });
    InternalError::from_response(err, response).into()
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/stats/trend`
pub async fn trend(state: web::Data<AppState>) -> HttpResponse {
    respond(
        "query trend",
        queries::trend(state.relation.as_ref()).await,
    )
}

/// `GET /api/stats/overview?year=`
pub async fn overview(state: web::Data<AppState>, params: web::Query<YearParams>) -> HttpResponse {
    let year = params.year.as_deref().unwrap_or_default();
    respond(
        "query yearly overview",
        queries::yearly_overview(state.relation.as_ref(), year, &state.baseline).await,
    )
}

/// `GET /api/stats/damage-batch?year=`
pub async fn damage_batch(
    state: web::Data<AppState>,
    params: web::Query<YearParams>,
) -> HttpResponse {
    let year = params.year.as_deref().unwrap_or_default();
    respond(
        "query damage by batch",
        queries::damage_by_batch(state.relation.as_ref(), year).await,
    )
}

/// `GET /api/stats/region?year=&scope=&name=`
///
/// Without `name`, groups by the scope's own level. With `name`, breaks that
/// region down one level.
pub async fn region(state: web::Data<AppState>, params: web::Query<RegionParams>) -> HttpResponse {
    let params = params.into_inner();
    respond(
        "query administrative stats",
        queries::administrative_stats(
            state.relation.as_ref(),
            params.year.as_deref().unwrap_or_default(),
            params.scope.as_deref().unwrap_or_default(),
            params.name.as_deref(),
        )
        .await,
    )
}

/// `GET /api/stats/protected-areas`
pub async fn protected_areas(
    state: web::Data<AppState>,
    params: web::Query<StatsParams>,
) -> HttpResponse {
    let query: StatsQuery = params.into_inner().into();
    respond(
        "query protected-area stats",
        queries::protected_area_stats(state.relation.as_ref(), &query).await,
    )
}

/// `GET /api/stats/spots`
pub async fn spots(state: web::Data<AppState>, params: web::Query<StatsParams>) -> HttpResponse {
    let query: StatsQuery = params.into_inner().into();
    respond(
        "query spot list",
        queries::spot_list(state.relation.as_ref(), &query).await,
    )
}

/// `GET /api/stats/transition`
///
/// Requires `qlx`, the before-category whose outflow is analysed.
pub async fn transition(
    state: web::Data<AppState>,
    params: web::Query<StatsParams>,
) -> HttpResponse {
    let query: StatsQuery = params.into_inner().into();
    respond(
        "query transition stats",
        queries::transition_stats(state.relation.as_ref(), &query).await,
    )
}

/// `GET /api/stats/alerts`
pub async fn alerts(state: web::Data<AppState>, params: web::Query<AlertParams>) -> HttpResponse {
    let alert: AlertQuery = params.into_inner().into();
    respond(
        "query large-spot alerts",
        queries::large_spot_alert(state.relation.as_ref(), &alert).await,
    )
}

/// `GET /api/patch/image?tbbh=`
///
/// Streams the patch image, or answers `200` with a plain-text notice when
/// there is none.
pub async fn patch_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    params: web::Query<ImageParams>,
) -> HttpResponse {
    let Some(patch_id) = params.tbbh.as_deref().filter(|id| !id.is_empty()) else {
        return HttpResponse::BadRequest().json(ApiError {
            error: "Missing required parameter: tbbh".to_string(),
        });
    };

    let Some(path) = state.images.image_path(patch_id) else {
        return HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(NO_IMAGE);
    };

    match NamedFile::open_async(&path).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            log::error!("Failed to open image {}: {e}", path.display());
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to read image".to_string(),
            })
        }
    }
}
