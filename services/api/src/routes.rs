//! API service routes
//!
//! One handler per (resource, verb) pair. Handlers validate input, enforce
//! ownership through the repository predicates, and serialize JSON
//! responses.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    error::ApiError,
    middleware::auth_middleware,
    models::{NewSet, SetPatch, User, UserResponse},
    state::AppState,
    validation::{
        validate_date, validate_integer, validate_positive_number, validate_required_fields,
    },
};

/// Inclusive upper bound for integer fields stored in int4 columns;
/// anything larger would wrap when narrowed to i32
const MAX_ID: Option<i64> = Some(i32::MAX as i64);

/// Query parameters for list endpoints
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Query parameters for the volume analytics endpoint
#[derive(Debug, Deserialize)]
pub struct VolumeQuery {
    pub days: Option<i64>,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/user/me", get(get_current_user))
        .route("/api/workouts/start", post(start_workout))
        .route("/api/workouts/today", get(get_today_workout))
        .route("/api/workouts", get(get_workouts))
        .route("/api/workouts/:id", get(get_workout))
        .route("/api/workouts/:id/end", put(end_workout))
        .route("/api/exercises", post(create_exercise))
        .route("/api/sets", post(log_set))
        .route("/api/sets/:id", put(update_set).delete(delete_set))
        .route("/api/bodyweight", post(log_bodyweight).get(get_bodyweight))
        .route("/api/bodyweight/latest", get(get_latest_bodyweight))
        .route("/api/analytics/exercise/:id", get(get_exercise_analytics))
        .route("/api/analytics/volume", get(get_volume_analytics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/exercises", get(get_exercises))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint, no auth required
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Get the current user profile
pub async fn get_current_user(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(UserResponse::from(&user))
}

/// Start a new workout
pub async fn start_workout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let data = body_object(&payload)?;
    validate_required_fields(data, &["workout_type"])?;

    let workout_type =
        validate_integer(&data["workout_type"], "workout_type", Some(1), Some(6))? as i32;
    let date = optional_date(data, "date")?.unwrap_or_else(today);
    let notes = field_str(data, "notes").unwrap_or("");

    let workout = state
        .workout_repository
        .create(user.id, date, workout_type, notes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create workout: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((StatusCode::CREATED, Json(workout)))
}

/// End a workout
pub async fn end_workout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(workout_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let workout = state
        .workout_repository
        .end(user.id, workout_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to end workout: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(workout))
}

/// Get today's workout with its sets, if one exists
pub async fn get_today_workout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let workout = state
        .workout_repository
        .find_by_date(user.id, today())
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up today's workout: {}", e);
            ApiError::InternalServerError
        })?;

    let Some(workout) = workout else {
        return Ok((StatusCode::NOT_FOUND, Json(json!({"workout": null}))));
    };

    let sets = state
        .set_repository
        .for_workout(workout.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load sets: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((
        StatusCode::OK,
        Json(json!({"workout": workout, "sets": sets})),
    ))
}

/// List the user's workouts, most recent first
pub async fn get_workouts(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50);

    let workouts = state
        .workout_repository
        .list(user.id, limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list workouts: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(workouts))
}

/// Get one workout with all its sets
pub async fn get_workout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(workout_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let workout = state
        .workout_repository
        .find(user.id, workout_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get workout: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound)?;

    let sets = state
        .set_repository
        .for_workout(workout.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load sets: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(json!({"workout": workout, "sets": sets})))
}

/// List the shared exercise catalog, no auth required
pub async fn get_exercises(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let exercises = state.exercise_repository.get_all().await.map_err(|e| {
        tracing::error!("Failed to list exercises: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(exercises))
}

/// Create a new catalog exercise
pub async fn create_exercise(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let data = body_object(&payload)?;
    validate_required_fields(data, &["name"])?;

    let name = field_str(data, "name")
        .ok_or_else(|| ApiError::Validation("name must be a string".to_string()))?;
    let muscle_group = field_str(data, "muscle_group").unwrap_or("");

    if let Some(existing) = state
        .exercise_repository
        .find_by_name(name)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up exercise: {}", e);
            ApiError::InternalServerError
        })?
    {
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({"error": "Exercise already exists", "exercise": existing})),
        ));
    }

    // The UNIQUE constraint backstops a racing duplicate insert
    let exercise = state
        .exercise_repository
        .create(name, muscle_group)
        .await
        .map_err(|e| {
            let unique_violation = e
                .downcast_ref::<sqlx::Error>()
                .and_then(sqlx::Error::as_database_error)
                .is_some_and(|db| db.is_unique_violation());
            if unique_violation {
                ApiError::Conflict("Exercise already exists".to_string())
            } else {
                tracing::error!("Failed to create exercise: {}", e);
                ApiError::InternalServerError
            }
        })?;

    Ok((StatusCode::CREATED, Json(json!(exercise))))
}

/// Log a new set
pub async fn log_set(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let data = body_object(&payload)?;
    validate_required_fields(data, &["workout_id", "exercise_id", "weight", "reps"])?;

    let workout_id = validate_integer(&data["workout_id"], "workout_id", Some(1), MAX_ID)? as i32;
    let exercise_id = validate_integer(&data["exercise_id"], "exercise_id", Some(1), MAX_ID)? as i32;
    let weight = validate_positive_number(&data["weight"], "weight")?;
    let reps = validate_integer(&data["reps"], "reps", Some(1), MAX_ID)? as i32;
    let set_number =
        validate_integer(field(data, "set_number"), "set_number", Some(1), MAX_ID)? as i32;

    let feel_rating = match field(data, "feel_rating") {
        Value::Null => None,
        value => Some(validate_integer(value, "feel_rating", Some(1), Some(10))? as i32),
    };
    let rpe = match field(data, "rpe") {
        Value::Null => None,
        value => Some(validate_integer(value, "rpe", Some(1), Some(10))? as f64),
    };
    let dropset_parent_id = match field(data, "dropset_parent_id") {
        Value::Null => None,
        value => Some(validate_integer(value, "dropset_parent_id", Some(1), MAX_ID)? as i32),
    };

    // The workout must belong to the authenticated user
    state
        .workout_repository
        .find(user.id, workout_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check workout ownership: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound)?;

    let new_set = NewSet {
        workout_id,
        exercise_id,
        set_number,
        weight,
        reps,
        feel_rating,
        rpe,
        tempo: field_str(data, "tempo").unwrap_or("normal").to_string(),
        rest_time: match field(data, "rest_time") {
            Value::Null => 0,
            value => validate_integer(value, "rest_time", Some(0), MAX_ID)? as i32,
        },
        is_dropset: data
            .get("is_dropset")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        dropset_parent_id,
        notes: field_str(data, "notes").unwrap_or("").to_string(),
    };

    let set = state.set_repository.create(&new_set).await.map_err(|e| {
        tracing::error!("Failed to log set: {}", e);
        ApiError::InternalServerError
    })?;

    Ok((StatusCode::CREATED, Json(set)))
}

/// Update an existing set. Present fields overwrite, absent fields are kept.
pub async fn update_set(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(set_id): Path<i32>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let data = body_object(&payload)?;
    let patch = build_set_patch(data)?;

    let set = state
        .set_repository
        .update(user.id, set_id, &patch)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update set: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(set))
}

/// Delete a set
pub async fn delete_set(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(set_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .set_repository
        .delete(user.id, set_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete set: {}", e);
            ApiError::InternalServerError
        })?;

    if deleted {
        Ok(Json(json!({"message": "Set deleted successfully"})))
    } else {
        Err(ApiError::NotFound)
    }
}

/// Log a body weight measurement
pub async fn log_bodyweight(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let data = body_object(&payload)?;
    validate_required_fields(data, &["weight"])?;

    let weight = validate_positive_number(&data["weight"], "weight")?;
    let date = optional_date(data, "date")?.unwrap_or_else(today);

    let entry = state
        .body_weight_repository
        .create(user.id, date, weight)
        .await
        .map_err(|e| {
            tracing::error!("Failed to log body weight: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Get body weight history
pub async fn get_bodyweight(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(100);

    let entries = state
        .body_weight_repository
        .list(user.id, limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list body weights: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(entries))
}

/// Get the most recent body weight measurement
pub async fn get_latest_bodyweight(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .body_weight_repository
        .latest(user.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get latest body weight: {}", e);
            ApiError::InternalServerError
        })?;

    match entry {
        Some(entry) => Ok((StatusCode::OK, Json(json!(entry)))),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({"weight": null})))),
    }
}

/// Per-exercise analytics over the user's recent sets
pub async fn get_exercise_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(exercise_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let exercise = state
        .exercise_repository
        .find_by_id(exercise_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get exercise: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound)?;

    let analytics = state
        .analytics_repository
        .exercise_analytics(user.id, exercise_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute exercise analytics: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(json!({"exercise": exercise, "analytics": analytics})))
}

/// Total volume per workout date over a trailing window
pub async fn get_volume_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<VolumeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query.days.unwrap_or(30);
    let start_date = today() - Duration::days(days);

    let points = state
        .analytics_repository
        .volume_over_time(user.id, start_date)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute volume analytics: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(points))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reject non-object request bodies before field validation
fn body_object(payload: &Value) -> Result<&Map<String, Value>, ApiError> {
    payload
        .as_object()
        .ok_or_else(|| ApiError::Validation("Request body must be a JSON object".to_string()))
}

/// Look up a field, treating absence as an explicit null
fn field<'a>(data: &'a Map<String, Value>, key: &str) -> &'a Value {
    data.get(key).unwrap_or(&Value::Null)
}

fn field_str<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Parse an optional date field; absent or null means "not provided"
fn optional_date(data: &Map<String, Value>, key: &str) -> Result<Option<NaiveDate>, ApiError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(validate_date(value, key)?)),
    }
}

/// Build a partial set update from the raw body, distinguishing absent
/// fields from explicit nulls
fn build_set_patch(data: &Map<String, Value>) -> Result<SetPatch, ApiError> {
    let mut patch = SetPatch::default();

    if let Some(value) = data.get("weight") {
        patch.weight = Some(validate_positive_number(value, "weight")?);
    }
    if let Some(value) = data.get("reps") {
        patch.reps = Some(validate_integer(value, "reps", Some(1), MAX_ID)? as i32);
    }
    if let Some(value) = data.get("feel_rating") {
        patch.feel_rating = Some(match value {
            Value::Null => None,
            value => Some(validate_integer(value, "feel_rating", Some(1), Some(10))? as i32),
        });
    }
    if let Some(value) = data.get("rpe") {
        patch.rpe = Some(match value {
            Value::Null => None,
            value => Some(validate_integer(value, "rpe", Some(1), Some(10))? as f64),
        });
    }
    if let Some(value) = data.get("tempo") {
        patch.tempo = Some(match value {
            Value::Null => None,
            value => Some(
                value
                    .as_str()
                    .ok_or_else(|| ApiError::Validation("tempo must be a string".to_string()))?
                    .to_string(),
            ),
        });
    }
    if let Some(value) = data.get("rest_time") {
        patch.rest_time = Some(match value {
            Value::Null => None,
            value => Some(validate_integer(value, "rest_time", Some(0), MAX_ID)? as i32),
        });
    }
    if let Some(value) = data.get("is_dropset") {
        patch.is_dropset = Some(
            value
                .as_bool()
                .ok_or_else(|| ApiError::Validation("is_dropset must be a boolean".to_string()))?,
        );
    }
    if let Some(value) = data.get("dropset_parent_id") {
        patch.dropset_parent_id = Some(match value {
            Value::Null => None,
            value => Some(validate_integer(value, "dropset_parent_id", Some(1), MAX_ID)? as i32),
        });
    }
    if let Some(value) = data.get("notes") {
        patch.notes = Some(match value {
            Value::Null => None,
            value => Some(
                value
                    .as_str()
                    .ok_or_else(|| ApiError::Validation("notes must be a string".to_string()))?
                    .to_string(),
            ),
        });
    }

    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn set_patch_tracks_absent_fields() {
        let patch = build_set_patch(&map(json!({}))).expect("empty patch");
        assert!(patch.weight.is_none());
        assert!(patch.notes.is_none());
    }

    #[test]
    fn set_patch_distinguishes_null_from_absent() {
        let patch = build_set_patch(&map(json!({"feel_rating": null}))).expect("patch");
        assert_eq!(patch.feel_rating, Some(None));
        assert!(patch.rpe.is_none());
    }

    #[test]
    fn set_patch_carries_present_values() {
        let patch = build_set_patch(&map(json!({
            "weight": 102.5,
            "reps": 8,
            "is_dropset": true,
            "notes": "paused reps",
        })))
        .expect("patch");

        assert_eq!(patch.weight, Some(102.5));
        assert_eq!(patch.reps, Some(8));
        assert_eq!(patch.is_dropset, Some(true));
        assert_eq!(patch.notes, Some(Some("paused reps".to_string())));
    }

    #[test]
    fn set_patch_rejects_invalid_present_values() {
        assert!(build_set_patch(&map(json!({"weight": 0}))).is_err());
        assert!(build_set_patch(&map(json!({"weight": null}))).is_err());
        assert!(build_set_patch(&map(json!({"reps": "many"}))).is_err());
        assert!(build_set_patch(&map(json!({"feel_rating": 11}))).is_err());
    }

    #[test]
    fn set_patch_rejects_values_wider_than_int4() {
        // Anything past i32::MAX must fail validation instead of wrapping
        // on the narrowing cast and storing a corrupted value.
        let err = build_set_patch(&map(json!({"reps": 4_294_967_297_i64}))).unwrap_err();
        match err {
            ApiError::Validation(msg) => {
                assert_eq!(msg, "reps must be at most 2147483647");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }

        assert!(build_set_patch(&map(json!({"rest_time": i64::MAX}))).is_err());
        assert!(build_set_patch(&map(json!({"dropset_parent_id": 2_147_483_648_i64}))).is_err());
    }

    #[test]
    fn int4_bound_covers_the_full_i32_range() {
        let patch = build_set_patch(&map(json!({"reps": i32::MAX}))).expect("max i32 is valid");
        assert_eq!(patch.reps, Some(i32::MAX));
    }

    #[test]
    fn body_object_rejects_non_objects() {
        assert!(body_object(&json!([1, 2])).is_err());
        assert!(body_object(&json!({"a": 1})).is_ok());
    }
}
