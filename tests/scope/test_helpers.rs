//! Shared fixtures for scope lifecycle scenarios.

use camino::Utf8PathBuf;
use mrgate::ScopeLayout;
use mrgate::test_support::RecordingTransport;
use rstest::fixture;

#[derive(Clone, Debug)]
pub enum ScopeOutcome {
    Created(u64),
    Deleted,
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct ScopeContext {
    pub transport: RecordingTransport,
    pub next_id: u64,
    pub outcome: Option<ScopeOutcome>,
}

impl ScopeContext {
    pub fn layout() -> ScopeLayout {
        ScopeLayout::new(Utf8PathBuf::from("/hdfs/scopes"), Utf8PathBuf::from("/work"))
    }
}

#[fixture]
pub fn scope_context() -> ScopeContext {
    ScopeContext {
        transport: RecordingTransport::new(),
        next_id: 1,
        outcome: None,
    }
}
