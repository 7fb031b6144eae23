//! Repositories for workouts, sets, and body-weight entries
//!
//! Every lookup predicate includes the owning user's id, so a record that
//! belongs to someone else is indistinguishable from one that does not
//! exist.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{BodyWeightResponse, NewSet, SetPatch, SetResponse, WorkoutResponse};

const WORKOUT_COLUMNS: &str = r#"
    w.id, w.user_id, w.date, w.workout_type, w.notes, w.created_at, w.ended_at,
    (SELECT COUNT(*) FROM workout_sets s WHERE s.workout_id = w.id) AS total_sets
"#;

const SET_COLUMNS: &str = r#"
    s.id, s.workout_id, s.exercise_id, e.name AS exercise_name, s.set_number,
    s.weight, s.reps, s.feel_rating, s.rpe, s.tempo, s.rest_time, s.is_dropset,
    s.dropset_parent_id, s.notes, s.created_at
"#;

/// Workout repository for database operations
#[derive(Clone)]
pub struct WorkoutRepository {
    pool: PgPool,
}

impl WorkoutRepository {
    /// Create a new workout repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a workout for a user
    pub async fn create(
        &self,
        user_id: i32,
        date: NaiveDate,
        workout_type: i32,
        notes: &str,
    ) -> Result<WorkoutResponse> {
        let workout = sqlx::query_as::<_, WorkoutResponse>(&format!(
            r#"
            INSERT INTO workouts AS w (user_id, date, workout_type, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(date)
        .bind(workout_type)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(workout)
    }

    /// Mark a workout as ended. Repeated calls simply move `ended_at`
    /// forward.
    pub async fn end(&self, user_id: i32, workout_id: i32) -> Result<Option<WorkoutResponse>> {
        let workout = sqlx::query_as::<_, WorkoutResponse>(&format!(
            r#"
            UPDATE workouts AS w
            SET ended_at = now()
            WHERE w.id = $1 AND w.user_id = $2
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workout)
    }

    /// Find a user's workout by id
    pub async fn find(&self, user_id: i32, workout_id: i32) -> Result<Option<WorkoutResponse>> {
        let workout = sqlx::query_as::<_, WorkoutResponse>(&format!(
            r#"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts w
            WHERE w.id = $1 AND w.user_id = $2
            "#
        ))
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workout)
    }

    /// Find a user's workout for the given calendar date, if any
    pub async fn find_by_date(
        &self,
        user_id: i32,
        date: NaiveDate,
    ) -> Result<Option<WorkoutResponse>> {
        let workout = sqlx::query_as::<_, WorkoutResponse>(&format!(
            r#"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts w
            WHERE w.user_id = $1 AND w.date = $2
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workout)
    }

    /// List a user's workouts, most recent date first
    pub async fn list(&self, user_id: i32, limit: i64) -> Result<Vec<WorkoutResponse>> {
        let workouts = sqlx::query_as::<_, WorkoutResponse>(&format!(
            r#"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts w
            WHERE w.user_id = $1
            ORDER BY w.date DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(workouts)
    }
}

/// Set repository for database operations
#[derive(Clone)]
pub struct SetRepository {
    pool: PgPool,
}

impl SetRepository {
    /// Create a new set repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All sets of one workout, in insertion order
    pub async fn for_workout(&self, workout_id: i32) -> Result<Vec<SetResponse>> {
        let sets = sqlx::query_as::<_, SetResponse>(&format!(
            r#"
            SELECT {SET_COLUMNS}
            FROM workout_sets s
            JOIN exercises e ON e.id = s.exercise_id
            WHERE s.workout_id = $1
            ORDER BY s.id
            "#
        ))
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sets)
    }

    /// Insert a set. The caller has already checked that the workout belongs
    /// to the authenticated user.
    pub async fn create(&self, new_set: &NewSet) -> Result<SetResponse> {
        let set_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO workout_sets (
                workout_id, exercise_id, set_number, weight, reps, feel_rating,
                rpe, tempo, rest_time, is_dropset, dropset_parent_id, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(new_set.workout_id)
        .bind(new_set.exercise_id)
        .bind(new_set.set_number)
        .bind(new_set.weight)
        .bind(new_set.reps)
        .bind(new_set.feel_rating)
        .bind(new_set.rpe)
        .bind(&new_set.tempo)
        .bind(new_set.rest_time)
        .bind(new_set.is_dropset)
        .bind(new_set.dropset_parent_id)
        .bind(&new_set.notes)
        .fetch_one(&self.pool)
        .await?;

        let set = self
            .find_by_id(set_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("set vanished after insert"))?;

        Ok(set)
    }

    async fn find_by_id(&self, set_id: i32) -> Result<Option<SetResponse>> {
        let set = sqlx::query_as::<_, SetResponse>(&format!(
            r#"
            SELECT {SET_COLUMNS}
            FROM workout_sets s
            JOIN exercises e ON e.id = s.exercise_id
            WHERE s.id = $1
            "#
        ))
        .bind(set_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(set)
    }

    /// Find a set owned by the given user
    pub async fn find_owned(&self, user_id: i32, set_id: i32) -> Result<Option<SetResponse>> {
        let set = sqlx::query_as::<_, SetResponse>(&format!(
            r#"
            SELECT {SET_COLUMNS}
            FROM workout_sets s
            JOIN workouts w ON w.id = s.workout_id
            JOIN exercises e ON e.id = s.exercise_id
            WHERE s.id = $1 AND w.user_id = $2
            "#
        ))
        .bind(set_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(set)
    }

    /// Apply a partial update to an owned set. Present fields overwrite,
    /// absent fields keep their stored value. Returns `None` when the set
    /// does not exist or belongs to another user.
    pub async fn update(
        &self,
        user_id: i32,
        set_id: i32,
        patch: &SetPatch,
    ) -> Result<Option<SetResponse>> {
        let Some(current) = self.find_owned(user_id, set_id).await? else {
            return Ok(None);
        };

        let weight = patch.weight.unwrap_or(current.weight);
        let reps = patch.reps.unwrap_or(current.reps);
        let feel_rating = patch.feel_rating.unwrap_or(current.feel_rating);
        let rpe = patch.rpe.unwrap_or(current.rpe);
        let tempo = patch.tempo.clone().unwrap_or(current.tempo);
        let rest_time = patch.rest_time.unwrap_or(current.rest_time);
        let is_dropset = patch.is_dropset.unwrap_or(current.is_dropset);
        let dropset_parent_id = patch.dropset_parent_id.unwrap_or(current.dropset_parent_id);
        let notes = patch.notes.clone().unwrap_or(current.notes);

        sqlx::query(
            r#"
            UPDATE workout_sets
            SET weight = $2, reps = $3, feel_rating = $4, rpe = $5, tempo = $6,
                rest_time = $7, is_dropset = $8, dropset_parent_id = $9, notes = $10
            WHERE id = $1
            "#,
        )
        .bind(set_id)
        .bind(weight)
        .bind(reps)
        .bind(feel_rating)
        .bind(rpe)
        .bind(&tempo)
        .bind(rest_time)
        .bind(is_dropset)
        .bind(dropset_parent_id)
        .bind(&notes)
        .execute(&self.pool)
        .await?;

        self.find_by_id(set_id).await
    }

    /// Delete an owned set; returns false when nothing matched
    pub async fn delete(&self, user_id: i32, set_id: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM workout_sets s
            USING workouts w
            WHERE s.id = $1 AND s.workout_id = w.id AND w.user_id = $2
            "#,
        )
        .bind(set_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Body weight repository for database operations
#[derive(Clone)]
pub struct BodyWeightRepository {
    pool: PgPool,
}

impl BodyWeightRepository {
    /// Create a new body weight repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a body weight measurement
    pub async fn create(
        &self,
        user_id: i32,
        date: NaiveDate,
        weight: f64,
    ) -> Result<BodyWeightResponse> {
        let entry = sqlx::query_as::<_, BodyWeightResponse>(
            r#"
            INSERT INTO body_weights (user_id, date, weight)
            VALUES ($1, $2, $3)
            RETURNING id, date, weight, created_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(weight)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Measurement history, most recent date first
    pub async fn list(&self, user_id: i32, limit: i64) -> Result<Vec<BodyWeightResponse>> {
        let entries = sqlx::query_as::<_, BodyWeightResponse>(
            r#"
            SELECT id, date, weight, created_at
            FROM body_weights
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Most recent measurement, if any
    pub async fn latest(&self, user_id: i32) -> Result<Option<BodyWeightResponse>> {
        let entry = sqlx::query_as::<_, BodyWeightResponse>(
            r#"
            SELECT id, date, weight, created_at
            FROM body_weights
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }
}
