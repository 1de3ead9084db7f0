//! Hadoop streaming jobs whose mapper and reducer are caller-supplied
//! scripts.
//!
//! Scripts arrive as text, so they are staged in a private local temporary
//! directory before upload. The directory is removed once the uploads have
//! finished, whether they succeeded or not.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use tempfile::TempDir;
use tracing::{info, warn};

use super::{JobError, JobKind, JobSubmitter};
use crate::channel::{Session, Transport};
use crate::command::RemoteCommand;
use crate::scope::Scope;

/// Remote file name of the streaming mapper script.
pub const MAPPER_NAME: &str = "streaming_mapper";

/// Remote file name of the streaming reducer script.
pub const REDUCER_NAME: &str = "streaming_reducer";

/// Mapper and reducer written to a local temporary directory.
#[derive(Debug)]
struct StagedScripts {
    dir: TempDir,
    mapper: Utf8PathBuf,
    reducer: Utf8PathBuf,
}

impl StagedScripts {
    fn write(mapper: &str, reducer: &str) -> Result<Self, JobError> {
        let dir = tempfile::Builder::new()
            .prefix("mrgate-streaming-")
            .tempdir()
            .map_err(materialize_error)?;
        let root = Utf8Path::from_path(dir.path()).ok_or_else(|| JobError::Materialize {
            job: JobKind::Streaming,
            message: format!("temporary directory is not UTF-8: {}", dir.path().display()),
        })?;
        let handle = Dir::open_ambient_dir(root, ambient_authority()).map_err(materialize_error)?;
        handle.write(MAPPER_NAME, mapper).map_err(materialize_error)?;
        handle.write(REDUCER_NAME, reducer).map_err(materialize_error)?;
        Ok(Self {
            mapper: root.join(MAPPER_NAME),
            reducer: root.join(REDUCER_NAME),
            dir,
        })
    }

    fn remove(self) {
        let location = self.dir.path().display().to_string();
        if let Err(err) = self.dir.close() {
            warn!(%location, error = %err, "failed to remove staged streaming scripts");
        }
    }
}

fn materialize_error(err: std::io::Error) -> JobError {
    JobError::Materialize {
        job: JobKind::Streaming,
        message: err.to_string(),
    }
}

impl<T: Transport> JobSubmitter<'_, T> {
    /// Runs a Hadoop streaming job with the given mapper and reducer script
    /// sources, reading `<data>/<input>` and writing `<data>/<output>`.
    ///
    /// The scripts are uploaded to `<work>/streaming_mapper` and
    /// `<work>/streaming_reducer` and shipped to the cluster with `-file`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Materialize`] when the scripts cannot be staged
    /// locally, [`JobError::Deploy`] when an upload fails, and
    /// [`JobError::Submit`] when the job fails.
    pub fn run_streaming_job(
        &self,
        scope: &Scope,
        mapper_source: &str,
        reducer_source: &str,
        input: &str,
        output: &str,
    ) -> Result<(), JobError> {
        let staged = StagedScripts::write(mapper_source, reducer_source)?;
        let remote_mapper = scope.work_path(MAPPER_NAME);
        let remote_reducer = scope.work_path(REDUCER_NAME);

        let command = RemoteCommand::new(format!("{} jar", self.tools.hadoop_bin))
            .arg(&self.tools.streaming_jar)
            .flag("-input", scope.data_path(input).as_str())
            .flag("-output", scope.data_path(output).as_str())
            .flag("-mapper", remote_mapper.as_str())
            .flag("-reducer", remote_reducer.as_str())
            .flag("-file", remote_mapper.as_str())
            .flag("-file", remote_reducer.as_str());

        self.submit(JobKind::Streaming, &command, move |session| {
            let uploaded = session
                .upload(&staged.mapper, &remote_mapper)
                .and_then(|()| session.upload(&staged.reducer, &remote_reducer));
            staged.remove();
            uploaded
        })?;
        info!(scope = scope.id(), %input, %output, "submitted streaming job");
        Ok(())
    }
}
