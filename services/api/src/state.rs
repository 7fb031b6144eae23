//! Application state shared across handlers

use sqlx::PgPool;

use crate::middleware::TokenVerifier;
use crate::repositories::{
    ExerciseRepository, UserRepository,
    analytics::AnalyticsRepository,
    workouts::{BodyWeightRepository, SetRepository, WorkoutRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub verifier: TokenVerifier,
    pub user_repository: UserRepository,
    pub exercise_repository: ExerciseRepository,
    pub workout_repository: WorkoutRepository,
    pub set_repository: SetRepository,
    pub body_weight_repository: BodyWeightRepository,
    pub analytics_repository: AnalyticsRepository,
}
