//! Read-only analytics queries over a user's sets

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{ExerciseAnalytics, SetResponse, VolumePoint};

/// How many of the most recent sets feed the per-exercise aggregation
const ANALYTICS_WINDOW: i64 = 100;

/// How many of those sets are echoed back verbatim
const RECENT_SETS: usize = 10;

/// Analytics repository for database operations
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    /// Create a new analytics repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Per-exercise statistics over the user's most recent sets. Returns
    /// `None` when the user has never logged this exercise.
    pub async fn exercise_analytics(
        &self,
        user_id: i32,
        exercise_id: i32,
    ) -> Result<Option<ExerciseAnalytics>> {
        let sets = sqlx::query_as::<_, SetResponse>(
            r#"
            SELECT s.id, s.workout_id, s.exercise_id, e.name AS exercise_name,
                   s.set_number, s.weight, s.reps, s.feel_rating, s.rpe, s.tempo,
                   s.rest_time, s.is_dropset, s.dropset_parent_id, s.notes,
                   s.created_at
            FROM workout_sets s
            JOIN workouts w ON w.id = s.workout_id
            JOIN exercises e ON e.id = s.exercise_id
            WHERE s.exercise_id = $1 AND w.user_id = $2
            ORDER BY s.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(exercise_id)
        .bind(user_id)
        .bind(ANALYTICS_WINDOW)
        .fetch_all(&self.pool)
        .await?;

        Ok(summarize_sets(sets))
    }

    /// Total volume per workout date over a trailing window. Dates without
    /// any sets are omitted.
    pub async fn volume_over_time(
        &self,
        user_id: i32,
        start_date: NaiveDate,
    ) -> Result<Vec<VolumePoint>> {
        let points = sqlx::query_as::<_, VolumePoint>(
            r#"
            SELECT w.date, SUM(s.weight * s.reps)::DOUBLE PRECISION AS volume
            FROM workouts w
            JOIN workout_sets s ON s.workout_id = w.id
            WHERE w.user_id = $1 AND w.date >= $2
            GROUP BY w.date
            ORDER BY w.date
            "#,
        )
        .bind(user_id)
        .bind(start_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }
}

/// Aggregate a newest-first list of sets into exercise statistics
fn summarize_sets(sets: Vec<SetResponse>) -> Option<ExerciseAnalytics> {
    if sets.is_empty() {
        return None;
    }

    let total_volume: f64 = sets.iter().map(|s| s.weight * f64::from(s.reps)).sum();
    let total_weight: f64 = sets.iter().map(|s| s.weight).sum();
    let max_weight = sets.iter().map(|s| s.weight).fold(f64::MIN, f64::max);
    let total_reps: i64 = sets.iter().map(|s| i64::from(s.reps)).sum();
    let avg_weight = round2(total_weight / sets.len() as f64);

    let total_sets = sets.len();
    let recent_sets: Vec<SetResponse> = sets.into_iter().take(RECENT_SETS).collect();

    Some(ExerciseAnalytics {
        total_sets,
        total_volume,
        avg_weight,
        max_weight,
        total_reps,
        recent_sets,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn set(weight: f64, reps: i32) -> SetResponse {
        SetResponse {
            id: 1,
            workout_id: 1,
            exercise_id: 1,
            exercise_name: "Squat".to_string(),
            set_number: 1,
            weight,
            reps,
            feel_rating: None,
            rpe: None,
            tempo: Some("normal".to_string()),
            rest_time: Some(90),
            is_dropset: false,
            dropset_parent_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_set_list_yields_no_analytics() {
        assert!(summarize_sets(vec![]).is_none());
    }

    #[test]
    fn aggregates_volume_weight_and_reps() {
        let analytics =
            summarize_sets(vec![set(100.0, 5), set(80.0, 8), set(60.0, 12)]).expect("analytics");

        assert_eq!(analytics.total_sets, 3);
        assert_eq!(analytics.total_volume, 100.0 * 5.0 + 80.0 * 8.0 + 60.0 * 12.0);
        assert_eq!(analytics.avg_weight, 80.0);
        assert_eq!(analytics.max_weight, 100.0);
        assert_eq!(analytics.total_reps, 25);
        assert_eq!(analytics.recent_sets.len(), 3);
    }

    #[test]
    fn average_weight_is_rounded_to_two_decimals() {
        let analytics = summarize_sets(vec![set(100.0, 5), set(95.0, 5), set(92.5, 5)])
            .expect("analytics");

        // (100 + 95 + 92.5) / 3 = 95.8333...
        assert_eq!(analytics.avg_weight, 95.83);
    }

    #[test]
    fn recent_sets_are_capped_at_ten() {
        let sets: Vec<SetResponse> = (0..25).map(|i| set(50.0 + f64::from(i), 5)).collect();
        let analytics = summarize_sets(sets).expect("analytics");

        assert_eq!(analytics.total_sets, 25);
        assert_eq!(analytics.recent_sets.len(), 10);
        // Order is preserved: the first element is still the newest
        assert_eq!(analytics.recent_sets[0].weight, 50.0);
    }

    #[test]
    fn round2_behaves_at_boundaries() {
        assert_eq!(round2(95.836), 95.84);
        assert_eq!(round2(95.0), 95.0);
        assert_eq!(round2(0.004), 0.0);
    }
}
