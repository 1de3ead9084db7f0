//! BDD scenarios for job submission.

use rstest_bdd_macros::scenario;

use super::test_helpers::{JobsContext, jobs_context};

#[scenario(
    path = "tests/features/jobs.feature",
    name = "Import a query that does not select the split column"
)]
fn scenario_import_boundary_query(jobs_context: JobsContext) {
    let _ = jobs_context;
}

#[scenario(
    path = "tests/features/jobs.feature",
    name = "Reject an unqualified split column before contacting the gateway"
)]
fn scenario_import_rejects_column(jobs_context: JobsContext) {
    let _ = jobs_context;
}

#[scenario(
    path = "tests/features/jobs.feature",
    name = "Run a streaming job with script mapper and reducer"
)]
fn scenario_streaming_job(jobs_context: JobsContext) {
    let _ = jobs_context;
}

#[scenario(
    path = "tests/features/jobs.feature",
    name = "Surface export failures without leaking the password"
)]
fn scenario_export_failure(jobs_context: JobsContext) {
    let _ = jobs_context;
}
