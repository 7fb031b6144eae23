//! Repositories for database operations

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::models::{Exercise, User};

pub mod analytics;
pub mod workouts;

/// Default exercise catalog seeded on startup
const DEFAULT_EXERCISES: &[(&str, &str)] = &[
    ("Squat", "Legs"),
    ("Bench Press", "Chest"),
    ("Deadlift", "Back"),
    ("Overhead Press", "Shoulders"),
    ("Barbell Row", "Back"),
    ("Pull-ups", "Back"),
    ("Dips", "Chest"),
    ("Romanian Deadlift", "Legs"),
    ("Front Squat", "Legs"),
    ("Incline Bench Press", "Chest"),
    ("Lat Pulldown", "Back"),
    ("Bicep Curl", "Arms"),
    ("Tricep Extension", "Arms"),
    ("Leg Press", "Legs"),
    ("Leg Curl", "Legs"),
    ("Leg Extension", "Legs"),
    ("Cable Fly", "Chest"),
    ("Face Pull", "Shoulders"),
    ("Lateral Raise", "Shoulders"),
    ("Calf Raise", "Legs"),
];

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the local user for an external subject id, creating one on
    /// first sight. Existing users get their last-login timestamp bumped.
    /// Both paths run inside one transaction.
    pub async fn resolve_or_create(
        &self,
        subject_id: &str,
        email: &str,
        name: &str,
    ) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, User>(
            r#"
            SELECT id, subject_id, email, name, created_at, last_login
            FROM users
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&mut *tx)
        .await?;

        let user = match existing {
            Some(user) => {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET last_login = now()
                    WHERE id = $1
                    RETURNING id, subject_id, email, name, created_at, last_login
                    "#,
                )
                .bind(user.id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                info!("Creating user for new subject: {}", subject_id);
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (subject_id, email, name)
                    VALUES ($1, $2, $3)
                    RETURNING id, subject_id, email, name, created_at, last_login
                    "#,
                )
                .bind(subject_id)
                .bind(email)
                .bind(name)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(user)
    }
}

/// Exercise repository for the shared catalog
#[derive(Clone)]
pub struct ExerciseRepository {
    pool: PgPool,
}

impl ExerciseRepository {
    /// Create a new exercise repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List the full catalog, alphabetically
    pub async fn get_all(&self) -> Result<Vec<Exercise>> {
        let exercises = sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, name, muscle_group
            FROM exercises
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(exercises)
    }

    /// Find an exercise by id
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, name, muscle_group
            FROM exercises
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exercise)
    }

    /// Find an exercise by its unique name (case-sensitive)
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, name, muscle_group
            FROM exercises
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exercise)
    }

    /// Create a catalog entry
    pub async fn create(&self, name: &str, muscle_group: &str) -> Result<Exercise> {
        let exercise = sqlx::query_as::<_, Exercise>(
            r#"
            INSERT INTO exercises (name, muscle_group)
            VALUES ($1, $2)
            RETURNING id, name, muscle_group
            "#,
        )
        .bind(name)
        .bind(muscle_group)
        .fetch_one(&self.pool)
        .await?;

        Ok(exercise)
    }

    /// Seed the default catalog; already-present names are left untouched
    pub async fn seed_defaults(&self) -> Result<()> {
        for (name, muscle_group) in DEFAULT_EXERCISES {
            sqlx::query(
                r#"
                INSERT INTO exercises (name, muscle_group)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(name)
            .bind(muscle_group)
            .execute(&self.pool)
            .await?;
        }

        info!("Seeded {} default exercises", DEFAULT_EXERCISES.len());
        Ok(())
    }
}
