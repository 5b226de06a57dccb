//! Fixtures shared by the repository tests.

use std::sync::Arc;

use tempfile::TempDir;

use crate::db::{create_pool, run_migrations, spawn_writer, DbPool, WriteHandle};

/// A migrated database in a temporary directory. Keep the `TempDir` alive for
/// the duration of the test.
pub(crate) fn test_db() -> (Arc<DbPool>, WriteHandle, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone()).expect("Failed to start writer");
    (pool, writer, temp_dir)
}
