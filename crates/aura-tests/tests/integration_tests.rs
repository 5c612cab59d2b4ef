//! Integration tests module that includes all integration test files.

#[path = "integration/backend_tests.rs"]
mod backend_tests;

#[path = "integration/diagnostics_tests.rs"]
mod diagnostics_tests;

#[path = "integration/handler_tests.rs"]
mod handler_tests;

#[path = "integration/lowering_tests.rs"]
mod lowering_tests;

#[path = "integration/parser_tests.rs"]
mod parser_tests;

#[path = "integration/resolve_tests.rs"]
mod resolve_tests;

#[path = "integration/transform_tests.rs"]
mod transform_tests;
