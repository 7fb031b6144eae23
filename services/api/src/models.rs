//! API models for entities and request/response payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub subject_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// Response for user operations
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Shared exercise catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: i32,
    pub name: String,
    pub muscle_group: Option<String>,
}

/// Workout payload, including the computed set count
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutResponse {
    pub id: i32,
    pub user_id: i32,
    pub date: NaiveDate,
    pub workout_type: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_sets: i64,
}

/// Set payload, including the joined exercise name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SetResponse {
    pub id: i32,
    pub workout_id: i32,
    pub exercise_id: i32,
    pub exercise_name: String,
    pub set_number: i32,
    pub weight: f64,
    pub reps: i32,
    pub feel_rating: Option<i32>,
    pub rpe: Option<f64>,
    pub tempo: Option<String>,
    pub rest_time: Option<i32>,
    pub is_dropset: bool,
    pub dropset_parent_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body weight payload
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BodyWeightResponse {
    pub id: i32,
    pub date: NaiveDate,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a set
#[derive(Debug, Clone)]
pub struct NewSet {
    pub workout_id: i32,
    pub exercise_id: i32,
    pub set_number: i32,
    pub weight: f64,
    pub reps: i32,
    pub feel_rating: Option<i32>,
    pub rpe: Option<f64>,
    pub tempo: String,
    pub rest_time: i32,
    pub is_dropset: bool,
    pub dropset_parent_id: Option<i32>,
    pub notes: String,
}

/// Partial update for a set
///
/// The outer `Option` tracks field presence; the inner one carries an
/// explicit null for nullable columns. Absent fields keep their stored
/// value.
#[derive(Debug, Clone, Default)]
pub struct SetPatch {
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub feel_rating: Option<Option<i32>>,
    pub rpe: Option<Option<f64>>,
    pub tempo: Option<Option<String>>,
    pub rest_time: Option<Option<i32>>,
    pub is_dropset: Option<bool>,
    pub dropset_parent_id: Option<Option<i32>>,
    pub notes: Option<Option<String>>,
}

/// Aggregated statistics for one exercise
#[derive(Debug, Serialize)]
pub struct ExerciseAnalytics {
    pub total_sets: usize,
    pub total_volume: f64,
    pub avg_weight: f64,
    pub max_weight: f64,
    pub total_reps: i64,
    pub recent_sets: Vec<SetResponse>,
}

/// One point of the volume-over-time series
#[derive(Debug, Serialize, FromRow)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub volume: f64,
}
