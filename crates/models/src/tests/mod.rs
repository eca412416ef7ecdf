/// Column-level validation rules (no database needed)
pub mod validation_tests;

/// Storage object persistence against a live database
pub mod storage_object_tests;

/// Database tests run only when a database is explicitly provided.
pub(crate) fn db_tests_enabled() -> bool {
    std::env::var("DATABASE_URL").is_ok() && std::env::var("SKIP_DB_TESTS").is_err()
}
