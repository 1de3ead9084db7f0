//! BDD scenarios for the scope lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ScopeContext, scope_context};

#[scenario(path = "tests/features/scope.feature", name = "Create a scope")]
fn scenario_create_scope(scope_context: ScopeContext) {
    let _ = scope_context;
}

#[scenario(
    path = "tests/features/scope.feature",
    name = "Delete a scope that was never created"
)]
fn scenario_delete_unknown_scope(scope_context: ScopeContext) {
    let _ = scope_context;
}

#[scenario(
    path = "tests/features/scope.feature",
    name = "Report connection failures when creating a scope"
)]
fn scenario_create_unreachable(scope_context: ScopeContext) {
    let _ = scope_context;
}
