use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod validation;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use sqlx::migrate::Migrator;

use crate::{
    middleware::{AuthConfig, TokenVerifier},
    repositories::{
        ExerciseRepository, UserRepository,
        analytics::AnalyticsRepository,
        workouts::{BodyWeightRepository, SetRepository, WorkoutRepository},
    },
    state::AppState,
};

static MIGRATOR: Migrator = sqlx::migrate!();

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Liftlog API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    // Seed the shared exercise catalog
    let exercise_repository = ExerciseRepository::new(pool.clone());
    exercise_repository.seed_defaults().await?;

    let auth_config = AuthConfig::from_env();
    if auth_config.is_none() {
        warn!("AUTH_DOMAIN/AUTH_AUDIENCE not set; token verification is disabled");
    }

    let app_state = AppState {
        db_pool: pool.clone(),
        verifier: TokenVerifier::new(auth_config),
        user_repository: UserRepository::new(pool.clone()),
        exercise_repository,
        workout_repository: WorkoutRepository::new(pool.clone()),
        set_repository: SetRepository::new(pool.clone()),
        body_weight_repository: BodyWeightRepository::new(pool.clone()),
        analytics_repository: AnalyticsRepository::new(pool),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("API service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
