//! BDD step definitions for job submission.

use mrgate::test_support::RecordingTransport;
use mrgate::{ImportSpec, JobError, JobSubmitter, RemoteChannel, Scope};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{DB_PASSWORD, JobOutcome, JobsContext};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a scope with id \"{id}\"")]
fn scope_with_id(mut jobs_context: JobsContext, id: u64) -> JobsContext {
    jobs_context.scope_id = id;
    jobs_context
}

#[given("the gateway rejects commands containing \"{fragment}\"")]
fn gateway_rejects(jobs_context: JobsContext, fragment: String) -> JobsContext {
    jobs_context.transport.fail_commands_containing(&fragment);
    jobs_context
}

#[when("I import \"{query}\" split by \"{column}\"")]
fn import_query(
    jobs_context: JobsContext,
    query: String,
    column: String,
) -> Result<JobsContext, StepError> {
    let spec = ImportSpec {
        connection: JobsContext::connection(),
        query,
        partition_column: column,
        destination: String::from("warehouse"),
    };
    let outcome = submit(&jobs_context, |submitter, scope| {
        submitter.import_from_rdbms(scope, &spec)
    });
    Ok(JobsContext {
        outcome: Some(outcome),
        ..jobs_context
    })
}

#[when("I run a streaming job from \"{input}\" to \"{output}\"")]
fn run_streaming(
    jobs_context: JobsContext,
    input: String,
    output: String,
) -> Result<JobsContext, StepError> {
    let outcome = submit(&jobs_context, |submitter, scope| {
        submitter.run_streaming_job(scope, "cat\n", "uniq -c\n", &input, &output)
    });
    Ok(JobsContext {
        outcome: Some(outcome),
        ..jobs_context
    })
}

#[when("I export \"{source}\" into table \"{table}\"")]
fn export_table(
    jobs_context: JobsContext,
    source: String,
    table: String,
) -> Result<JobsContext, StepError> {
    let outcome = submit(&jobs_context, |submitter, scope| {
        submitter.export_to_rdbms(scope, &JobsContext::connection(), &table, &source)
    });
    Ok(JobsContext {
        outcome: Some(outcome),
        ..jobs_context
    })
}

#[then("the job succeeds")]
fn job_succeeds(jobs_context: &JobsContext) -> Result<(), StepError> {
    match jobs_context.outcome {
        Some(JobOutcome::Success) => Ok(()),
        Some(JobOutcome::Failure(ref message)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the job fails mentioning \"{text}\"")]
fn job_fails_mentioning(jobs_context: &JobsContext, text: String) -> Result<(), StepError> {
    let message = failure_message(jobs_context)?;
    if message.contains(&text) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected failure mentioning {text:?}, got: {message}"
        )))
    }
}

#[then("the failure does not mention the password")]
fn failure_hides_password(jobs_context: &JobsContext) -> Result<(), StepError> {
    let message = failure_message(jobs_context)?;
    if message.contains(DB_PASSWORD) {
        return Err(StepError::Assertion(format!("password leaked: {message}")));
    }
    Ok(())
}

#[then("the remote command contains \"{fragment}\"")]
fn remote_command_contains(jobs_context: &JobsContext, fragment: String) -> Result<(), StepError> {
    let command = jobs_context
        .last_command()
        .ok_or_else(|| StepError::Assertion(String::from("no remote command ran")))?;
    if command.contains(&fragment) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {fragment:?} in remote command: {command}"
        )))
    }
}

#[then("no remote call was made")]
fn no_remote_call(jobs_context: &JobsContext) -> Result<(), StepError> {
    let events = jobs_context.transport.events();
    if events.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected events: {events:?}")))
    }
}

#[then("\"{count}\" scripts were uploaded")]
fn scripts_uploaded(jobs_context: &JobsContext, count: usize) -> Result<(), StepError> {
    let uploads = jobs_context.transport.uploads();
    if uploads.len() != count {
        return Err(StepError::Assertion(format!(
            "expected {count} uploads, got {uploads:?}"
        )));
    }
    match uploads.iter().find(|(local, _, _)| local.exists()) {
        Some((local, _, _)) => Err(StepError::Assertion(format!(
            "staged script left behind: {local}"
        ))),
        None => Ok(()),
    }
}

fn submit<F>(jobs_context: &JobsContext, job: F) -> JobOutcome
where
    F: FnOnce(&JobSubmitter<'_, RecordingTransport>, &Scope) -> Result<(), JobError>,
{
    let channel = RemoteChannel::new(jobs_context.transport.clone());
    let scope = jobs_context.scope(&channel);
    let submitter = JobSubmitter::new(&channel, JobsContext::tools());
    match job(&submitter, &scope) {
        Ok(()) => JobOutcome::Success,
        Err(err) => JobOutcome::Failure(err.to_string()),
    }
}

fn failure_message(jobs_context: &JobsContext) -> Result<&str, StepError> {
    match jobs_context.outcome {
        Some(JobOutcome::Failure(ref message)) => Ok(message),
        Some(JobOutcome::Success) => Err(StepError::Assertion(String::from(
            "expected failure, got success",
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}
