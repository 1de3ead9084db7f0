//! BDD step definitions for the scope lifecycle.

use mrgate::test_support::ChannelEvent;
use mrgate::{RemoteChannel, ScopeManager};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{ScopeContext, ScopeOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("scope ids are drawn as \"{id}\"")]
fn scope_ids_are(mut scope_context: ScopeContext, id: u64) -> ScopeContext {
    scope_context.next_id = id;
    scope_context
}

#[given("the gateway is unreachable")]
fn gateway_unreachable(scope_context: ScopeContext) -> ScopeContext {
    scope_context.transport.fail_connect();
    scope_context
}

#[when("I create a scope")]
fn create_scope(scope_context: ScopeContext) -> Result<ScopeContext, StepError> {
    let channel = RemoteChannel::new(scope_context.transport.clone());
    let next_id = scope_context.next_id;
    let manager = ScopeManager::new(&channel, ScopeContext::layout(), "hadoop")
        .with_id_source(move || next_id);
    let outcome = match manager.create_scope() {
        Ok(scope) => ScopeOutcome::Created(scope.id()),
        Err(err) => ScopeOutcome::Failure(err.to_string()),
    };
    Ok(ScopeContext {
        outcome: Some(outcome),
        ..scope_context
    })
}

#[when("I delete scope \"{id}\"")]
fn delete_scope(scope_context: ScopeContext, id: u64) -> Result<ScopeContext, StepError> {
    let channel = RemoteChannel::new(scope_context.transport.clone());
    let manager = ScopeManager::new(&channel, ScopeContext::layout(), "hadoop");
    let outcome = match manager.delete_scope(id) {
        Ok(()) => ScopeOutcome::Deleted,
        Err(err) => ScopeOutcome::Failure(err.to_string()),
    };
    Ok(ScopeContext {
        outcome: Some(outcome),
        ..scope_context
    })
}

#[then("the scope operation succeeds")]
fn operation_succeeds(scope_context: &ScopeContext) -> Result<(), StepError> {
    match scope_context.outcome {
        Some(ScopeOutcome::Created(id)) if id == scope_context.next_id => Ok(()),
        Some(ScopeOutcome::Deleted) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected success, got {other:?}"
        ))),
    }
}

#[then("the scope operation fails mentioning \"{text}\"")]
fn operation_fails(scope_context: &ScopeContext, text: String) -> Result<(), StepError> {
    match scope_context.outcome {
        Some(ScopeOutcome::Failure(ref message)) if message.contains(&text) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected failure mentioning {text:?}, got {other:?}"
        ))),
    }
}

#[then("the gateway ran \"{line}\"")]
fn gateway_ran(scope_context: &ScopeContext, line: String) -> Result<(), StepError> {
    let commands = scope_context.transport.commands();
    if commands.contains(&line) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {line:?} among {commands:?}"
        )))
    }
}

#[then("the gateway was connected \"{count}\" times")]
fn gateway_connected(scope_context: &ScopeContext, count: usize) -> Result<(), StepError> {
    let connects = scope_context
        .transport
        .events()
        .iter()
        .filter(|event| matches!(event, ChannelEvent::Connect))
        .count();
    if connects == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} connections, got {connects}"
        )))
    }
}
