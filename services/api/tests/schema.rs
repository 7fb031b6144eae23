//! Contract checks on the initial schema
//!
//! The delete behavior of the foreign keys is load-bearing: user and
//! workout deletion must cascade, while deleting a dropset parent must
//! orphan its children instead of failing. These checks pin the clauses in
//! the migration so a schema edit cannot silently change that behavior.

const INIT_MIGRATION: &str = include_str!("../migrations/0001_init.sql");

fn table_definition(table: &str) -> &'static str {
    let start = INIT_MIGRATION
        .find(&format!("CREATE TABLE {table}"))
        .unwrap_or_else(|| panic!("{table} missing from initial migration"));
    let end = INIT_MIGRATION[start..]
        .find(';')
        .expect("unterminated table definition");
    &INIT_MIGRATION[start..start + end]
}

#[test]
fn workouts_cascade_from_users() {
    let workouts = table_definition("workouts");
    assert!(workouts.contains("REFERENCES users (id) ON DELETE CASCADE"));
}

#[test]
fn sets_cascade_from_workouts() {
    let sets = table_definition("workout_sets");
    assert!(sets.contains("REFERENCES workouts (id) ON DELETE CASCADE"));
}

#[test]
fn body_weights_cascade_from_users() {
    let body_weights = table_definition("body_weights");
    assert!(body_weights.contains("REFERENCES users (id) ON DELETE CASCADE"));
}

#[test]
fn deleting_a_dropset_parent_orphans_its_children() {
    // A plain FK here would reject deletion of any set that a later
    // dropset references as its parent.
    let sets = table_definition("workout_sets");
    assert!(
        sets.contains("dropset_parent_id INTEGER REFERENCES workout_sets (id) ON DELETE SET NULL")
    );
}
