//! Job submission against a scope.
//!
//! Every job is one channel session: deployment uploads (if any) followed
//! by exactly one remote command built with [`RemoteCommand`].

use std::fmt;

use camino::Utf8Path;
use thiserror::Error;
use tracing::info;

use crate::channel::{ChannelError, RemoteChannel, Session, Transport};
use crate::command::RemoteCommand;
use crate::query::{QueryError, rewrite_import_query};
use crate::scope::Scope;

mod streaming;

pub use streaming::{MAPPER_NAME, REDUCER_NAME};

/// File name of an uploaded jar inside the scope's working directory.
pub const JAR_UPLOAD_NAME: &str = "mapreduce_wsi_upload.jar";

/// Cluster client programs available on the gateway host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterTools {
    /// `hadoop` client used for HDFS and streaming jobs.
    pub hadoop_bin: String,
    /// `yarn` client used to run jars.
    pub yarn_bin: String,
    /// `sqoop` client used for RDBMS transfers.
    pub sqoop_bin: String,
    /// Path of the Hadoop streaming jar on the gateway host.
    pub streaming_jar: String,
}

/// Database endpoint shared by imports and exports.
#[derive(Clone, Eq, PartialEq)]
pub struct ConnectionSpec {
    /// JDBC connection URI.
    pub uri: String,
    /// Database user.
    pub user: String,
    /// Database password, passed through to Sqoop unchanged.
    pub credentials: String,
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("credentials", &"***")
            .finish()
    }
}

/// Parameters of an RDBMS to HDFS import.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportSpec {
    /// Source database.
    pub connection: ConnectionSpec,
    /// `SELECT` statement producing the imported rows.
    pub query: String,
    /// Split column as `table.column`.
    pub partition_column: String,
    /// Target directory name inside the scope's data directory.
    pub destination: String,
}

/// Kind of job, used to label failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobKind {
    /// `yarn jar` execution of an uploaded jar.
    Jar,
    /// Hadoop streaming job with script mapper and reducer.
    Streaming,
    /// `sqoop import` from a database.
    Import,
    /// `sqoop export` to a database.
    Export,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jar => "jar job",
            Self::Streaming => "streaming job",
            Self::Import => "sqoop import",
            Self::Export => "sqoop export",
        })
    }
}

/// Errors raised while deploying or submitting jobs.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum JobError {
    /// Uploading job artefacts to the gateway failed.
    #[error("failed to deploy {job}: {source}")]
    Deploy {
        /// Job being deployed.
        job: JobKind,
        /// Underlying channel failure.
        #[source]
        source: ChannelError,
    },
    /// Local temporary files for the job could not be written.
    #[error("failed to stage {job} files locally: {message}")]
    Materialize {
        /// Job being staged.
        job: JobKind,
        /// Description of the local I/O failure.
        message: String,
    },
    /// The job command failed to run on the gateway.
    #[error("failed to run {job}: {source}")]
    Submit {
        /// Job being submitted.
        job: JobKind,
        /// Underlying channel failure.
        #[source]
        source: ChannelError,
    },
    /// The import query could not be rewritten.
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Builds and submits job command lines through a shared channel.
#[derive(Debug)]
pub struct JobSubmitter<'c, T> {
    channel: &'c RemoteChannel<T>,
    tools: ClusterTools,
}

impl<'c, T: Transport> JobSubmitter<'c, T> {
    /// Creates a submitter using `tools` on the gateway host.
    #[must_use]
    pub const fn new(channel: &'c RemoteChannel<T>, tools: ClusterTools) -> Self {
        Self { channel, tools }
    }

    /// Uploads `local_jar` into the scope's working directory and runs it
    /// with `yarn jar`, passing the scope's data directory followed by
    /// `args`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Deploy`] when the jar cannot be uploaded and
    /// [`JobError::Submit`] when the job fails.
    pub fn run_jar<I, S>(
        &self,
        scope: &Scope,
        local_jar: &Utf8Path,
        args: I,
    ) -> Result<(), JobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let remote_jar = scope.work_path(JAR_UPLOAD_NAME);
        let command = RemoteCommand::new(format!("{} jar", self.tools.yarn_bin))
            .arg(remote_jar.as_str())
            .arg(scope.data_dir().as_str())
            .args(args);

        self.submit(JobKind::Jar, &command, |session| {
            session.upload(local_jar, &remote_jar)
        })?;
        info!(scope = scope.id(), jar = %local_jar, "submitted jar job");
        Ok(())
    }

    /// Imports the rows of `spec.query` into `<data>/<destination>` with
    /// `sqoop import`, split on `spec.partition_column`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Query`] before any remote call when the query or
    /// partition column is rejected, and [`JobError::Submit`] when Sqoop
    /// fails.
    pub fn import_from_rdbms(&self, scope: &Scope, spec: &ImportSpec) -> Result<(), JobError> {
        let rewritten = rewrite_import_query(&spec.query, &spec.partition_column)?;
        let command = connection_flags(
            RemoteCommand::new(format!("{} import", self.tools.sqoop_bin)),
            &spec.connection,
        )
        .flag("--query", &rewritten.full_query)
        .flag("--target-dir", scope.data_path(&spec.destination).as_str())
        .flag("--split-by", &spec.partition_column)
        .flag("--boundary-query", &rewritten.boundary_query);

        self.submit(JobKind::Import, &command, |_| Ok(()))?;
        info!(
            scope = scope.id(),
            destination = %spec.destination,
            "submitted sqoop import"
        );
        Ok(())
    }

    /// Exports `<data>/<source>` into database table `table` with
    /// `sqoop export`, reading tab separated fields.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Submit`] when Sqoop fails.
    pub fn export_to_rdbms(
        &self,
        scope: &Scope,
        connection: &ConnectionSpec,
        table: &str,
        source: &str,
    ) -> Result<(), JobError> {
        let command = connection_flags(
            RemoteCommand::new(format!("{} export", self.tools.sqoop_bin)),
            connection,
        )
        .flag("--table", table)
        .flag("--export-dir", scope.data_path(source).as_str())
        .raw("--fields-terminated-by")
        .arg("\\t");

        self.submit(JobKind::Export, &command, |_| Ok(()))?;
        info!(scope = scope.id(), table, "submitted sqoop export");
        Ok(())
    }

    /// Runs `deploy` and then `command` in one session. Failures before the
    /// command starts, including connecting, are deployment failures unless
    /// the job has nothing to deploy.
    fn submit<D>(&self, job: JobKind, command: &RemoteCommand, deploy: D) -> Result<(), JobError>
    where
        D: FnOnce(&mut T::Session) -> Result<(), ChannelError>,
    {
        let connect_failure = |source| match job {
            JobKind::Jar | JobKind::Streaming => JobError::Deploy { job, source },
            JobKind::Import | JobKind::Export => JobError::Submit { job, source },
        };
        self.channel
            .session(|session| {
                Ok(deploy(session)
                    .map_err(|source| JobError::Deploy { job, source })
                    .and_then(|()| {
                        session
                            .execute(command)
                            .map_err(|source| JobError::Submit { job, source })
                    }))
            })
            .map_err(connect_failure)??;
        Ok(())
    }
}

fn connection_flags(command: RemoteCommand, connection: &ConnectionSpec) -> RemoteCommand {
    command
        .flag("--connect", &connection.uri)
        .flag("--username", &connection.user)
        .secret("--password", &connection.credentials)
}
