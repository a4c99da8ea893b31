use anyhow::{anyhow, Context};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::body_extractor::OptionalJson;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::logic::{validate_point_of_interest, PatchDocument, PatchReconciler};
use crate::model::{
    CityDto, CityWithoutPointsOfInterestDto, Id, PointOfInterest, PointOfInterestDto,
    PointOfInterestForCreationDto, PointOfInterestForUpdateDto,
};
use crate::store::repository::CityInfoRepository;
use crate::store::traits::CityInfoStore;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /api/testdatabase
/// Confirms the store is reachable
pub async fn test_database<S: CityInfoStore>(
    State(state): State<AppState<S>>,
) -> Result<StatusCode, ApiError> {
    state.store.ping().await?;
    Ok(StatusCode::OK)
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    #[serde(rename = "includePointOfInterest", default)]
    pub include_point_of_interest: bool,
}

// City handlers

/// GET /api/cities
/// An empty list is a valid answer, so there is no 404 here
pub async fn get_cities<S: CityInfoStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<CityWithoutPointsOfInterestDto>>, ApiError> {
    let repo = CityInfoRepository::new(&*state.store);
    let cities = repo.get_cities().await.context("Failed to list cities")?;

    Ok(Json(
        cities.iter().map(CityWithoutPointsOfInterestDto::from).collect(),
    ))
}

/// GET /api/cities/{id}?includePointOfInterest=bool
pub async fn get_city<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path(city_id): Path<Id>,
    Query(query): Query<CityQuery>,
) -> Result<Response, ApiError> {
    let repo = CityInfoRepository::new(&*state.store);
    let city = repo
        .get_city(city_id, query.include_point_of_interest)
        .await
        .with_context(|| format!("Failed to fetch city {}", city_id))?
        .ok_or_else(|| ApiError::NotFound(format!("City {} was not found", city_id)))?;

    if query.include_point_of_interest {
        Ok(Json(CityDto::from(&city)).into_response())
    } else {
        Ok(Json(CityWithoutPointsOfInterestDto::from(&city)).into_response())
    }
}

// Point of interest handlers

/// GET /api/cities/{city_id}/pointsofinterest
pub async fn get_points_of_interest<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path(city_id): Path<Id>,
) -> Result<Json<Vec<PointOfInterestDto>>, ApiError> {
    let repo = CityInfoRepository::new(&*state.store);

    if !repo
        .city_exists(city_id)
        .await
        .with_context(|| format!("Failed to check city {}", city_id))?
    {
        log::info!(
            "City with id {} wasn't found when accessing points of interest",
            city_id
        );
        return Err(city_not_found(city_id));
    }

    let points = repo
        .get_points_of_interest(city_id)
        .await
        .with_context(|| format!("Failed to get points of interest for city {}", city_id))?;

    Ok(Json(points.iter().map(PointOfInterestDto::from).collect()))
}

/// GET /api/cities/{city_id}/pointsofinterest/{id}
pub async fn get_point_of_interest<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path((city_id, point_id)): Path<(Id, Id)>,
) -> Result<Json<PointOfInterestDto>, ApiError> {
    let repo = CityInfoRepository::new(&*state.store);
    let point = find_point(&repo, city_id, point_id).await?;
    Ok(Json(PointOfInterestDto::from(&point)))
}

/// POST /api/cities/{city_id}/pointsofinterest
/// Responds 201 with a Location header pointing at the new point
pub async fn create_point_of_interest<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path(city_id): Path<Id>,
    OptionalJson(body): OptionalJson<PointOfInterestForCreationDto>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(dto) = body else {
        return Err(missing_body());
    };
    validate_point_of_interest(&dto).map_err(ApiError::Validation)?;

    let mut repo = CityInfoRepository::new(&*state.store);
    if !repo
        .city_exists(city_id)
        .await
        .with_context(|| format!("Failed to check city {}", city_id))?
    {
        return Err(city_not_found(city_id));
    }

    repo.add_point_of_interest(city_id, PointOfInterest::from(dto));
    if !repo.commit().await {
        return Err(ApiError::PersistenceFailure);
    }

    let created = repo
        .inserted_points()
        .first()
        .ok_or_else(|| anyhow!("Commit succeeded without returning the inserted point"))?;
    let location = format!("/api/cities/{}/pointsofinterest/{}", city_id, created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(PointOfInterestDto::from(created)),
    ))
}

/// PUT /api/cities/{city_id}/pointsofinterest/{id}
/// Full update: fields missing from the body are cleared
pub async fn update_point_of_interest<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path((city_id, point_id)): Path<(Id, Id)>,
    OptionalJson(body): OptionalJson<PointOfInterestForUpdateDto>,
) -> Result<StatusCode, ApiError> {
    let Some(dto) = body else {
        return Err(missing_body());
    };
    validate_point_of_interest(&dto).map_err(ApiError::Validation)?;

    let mut repo = CityInfoRepository::new(&*state.store);
    let mut point = find_point(&repo, city_id, point_id).await?;

    point.apply_update(dto);
    repo.update_point_of_interest(point);
    if !repo.commit().await {
        return Err(ApiError::PersistenceFailure);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/cities/{city_id}/pointsofinterest/{id}
/// Body is a patch document, e.g. `[{"op": "replace", "path": "/name", "value": "Obelisk"}]`
pub async fn partially_update_point_of_interest<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path((city_id, point_id)): Path<(Id, Id)>,
    OptionalJson(body): OptionalJson<PatchDocument>,
) -> Result<StatusCode, ApiError> {
    let Some(document) = body else {
        return Err(missing_body());
    };

    let mut repo = CityInfoRepository::new(&*state.store);
    PatchReconciler::partially_update(&mut repo, city_id, point_id, &document).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cities/{city_id}/pointsofinterest/{id}
/// Sends a notification once the deletion is committed
pub async fn delete_point_of_interest<S: CityInfoStore>(
    State(state): State<AppState<S>>,
    Path((city_id, point_id)): Path<(Id, Id)>,
) -> Result<StatusCode, ApiError> {
    let mut repo = CityInfoRepository::new(&*state.store);
    let point = find_point(&repo, city_id, point_id).await?;

    let subject = "Point of interest deleted";
    let message = format!(
        "Point of interest {} with id {} was deleted",
        point.name, point.id
    );

    repo.delete_point_of_interest(point);
    if !repo.commit().await {
        return Err(ApiError::PersistenceFailure);
    }

    state.mail.send(subject, &message);
    Ok(StatusCode::NO_CONTENT)
}

// Helper function to look up a point that must belong to the given city
async fn find_point<S: CityInfoStore>(
    repo: &CityInfoRepository<'_, S>,
    city_id: Id,
    point_id: Id,
) -> Result<PointOfInterest, ApiError> {
    if !repo
        .city_exists(city_id)
        .await
        .with_context(|| format!("Failed to check city {}", city_id))?
    {
        return Err(city_not_found(city_id));
    }

    repo.get_point_of_interest(city_id, point_id)
        .await
        .with_context(|| format!("Failed to fetch point of interest {}", point_id))?
        .ok_or_else(|| {
            log::info!(
                "Point of interest {} wasn't found in city {}",
                point_id,
                city_id
            );
            ApiError::NotFound(format!(
                "Point of interest {} was not found in city {}",
                point_id, city_id
            ))
        })
}

fn city_not_found(city_id: Id) -> ApiError {
    ApiError::NotFound(format!("City {} was not found", city_id))
}

fn missing_body() -> ApiError {
    ApiError::BadRequest("A request body is required".to_string())
}
