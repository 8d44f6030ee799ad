//! Integration test modules.

mod fetch_loop_test;
mod headwind_pipeline_test;
