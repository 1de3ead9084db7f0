//! Shared fixtures for job submission scenarios.

use camino::Utf8PathBuf;
use mrgate::test_support::RecordingTransport;
use mrgate::{ClusterTools, ConnectionSpec, RemoteChannel, Scope, ScopeLayout, ScopeManager};
use rstest::fixture;

pub const DB_PASSWORD: &str = "hunter2-secret";

#[derive(Clone, Debug)]
pub enum JobOutcome {
    Success,
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct JobsContext {
    pub transport: RecordingTransport,
    pub scope_id: u64,
    pub outcome: Option<JobOutcome>,
}

impl JobsContext {
    pub fn layout() -> ScopeLayout {
        ScopeLayout::new(Utf8PathBuf::from("/hdfs/scopes"), Utf8PathBuf::from("/work"))
    }

    pub fn scope(&self, channel: &RemoteChannel<RecordingTransport>) -> Scope {
        ScopeManager::new(channel, Self::layout(), "hadoop").scope(self.scope_id)
    }

    pub fn tools() -> ClusterTools {
        ClusterTools {
            hadoop_bin: String::from("hadoop"),
            yarn_bin: String::from("yarn"),
            sqoop_bin: String::from("sqoop"),
            streaming_jar: String::from("/opt/streaming.jar"),
        }
    }

    pub fn connection() -> ConnectionSpec {
        ConnectionSpec {
            uri: String::from("jdbc:mysql://db.example/sales"),
            user: String::from("etl"),
            credentials: String::from(DB_PASSWORD),
        }
    }

    pub fn last_command(&self) -> Option<String> {
        self.transport.commands().last().cloned()
    }
}

#[fixture]
pub fn jobs_context() -> JobsContext {
    JobsContext {
        transport: RecordingTransport::new(),
        scope_id: 0,
        outcome: None,
    }
}
