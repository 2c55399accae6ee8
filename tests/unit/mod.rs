//! Unit tests for individual components

mod error_test;
mod audit_test;
mod config_test;
mod schedule_test;
mod builders_test;
mod runtime_test;
mod push_test;
