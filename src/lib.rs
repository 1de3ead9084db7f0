//! Core library for the `mrgate` Hadoop gateway.
//!
//! Several clients share one remote gateway host. Each client works inside
//! a scope (a pair of HDFS and gateway-local directories), and every remote
//! command or upload goes through one serialised [`RemoteChannel`]. Jobs
//! are submitted by assembling `yarn`, `hadoop`, and `sqoop` command lines
//! whose external values are shell-escaped.

pub mod channel;
pub mod command;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod query;
pub mod scope;
pub mod test_support;

pub use channel::{
    ChannelError, ClientOutput, ClientRunner, RemoteChannel, Session, SshSettings, SshTransport,
    SystemClientRunner, Transport,
};
pub use command::{RemoteCommand, quote};
pub use config::{ConfigError, GatewayConfig};
pub use jobs::{ClusterTools, ConnectionSpec, ImportSpec, JobError, JobKind, JobSubmitter};
pub use query::{QueryDecomposition, QueryError, RewrittenQuery, decompose, rewrite_import_query};
pub use scope::{RandomScopeIds, Scope, ScopeError, ScopeIdSource, ScopeLayout, ScopeManager};
