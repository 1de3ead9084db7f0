//! Per-client workspaces on the shared gateway.
//!
//! A scope pairs an HDFS directory with a working directory on the gateway
//! host's local disk, both named `<base>/<id>`. Ids are random and never
//! reserved, so collisions are possible though unlikely.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::channel::{ChannelError, RemoteChannel, Session, Transport};
use crate::command::RemoteCommand;

/// Base directories from which every scope's paths are derived.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScopeLayout {
    hdfs_base: Utf8PathBuf,
    local_base: Utf8PathBuf,
}

impl ScopeLayout {
    /// Creates a layout rooted at the given HDFS and gateway-local bases.
    #[must_use]
    pub const fn new(hdfs_base: Utf8PathBuf, local_base: Utf8PathBuf) -> Self {
        Self {
            hdfs_base,
            local_base,
        }
    }

    /// HDFS directory holding one subdirectory per scope.
    #[must_use]
    pub fn hdfs_base(&self) -> &Utf8Path {
        &self.hdfs_base
    }

    /// Gateway-local directory holding one working directory per scope.
    #[must_use]
    pub fn local_base(&self) -> &Utf8Path {
        &self.local_base
    }

    fn resolve(&self, id: u64) -> Scope {
        let name = id.to_string();
        Scope {
            id,
            data_dir: self.hdfs_base.join(&name),
            work_dir: self.local_base.join(&name),
        }
    }
}

/// Isolated workspace handed to a client.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Scope {
    id: u64,
    data_dir: Utf8PathBuf,
    work_dir: Utf8PathBuf,
}

impl Scope {
    /// Identifier the client uses to refer to this scope.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// HDFS directory owned by the scope.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Working directory on the gateway host owned by the scope.
    #[must_use]
    pub fn work_dir(&self) -> &Utf8Path {
        &self.work_dir
    }

    /// HDFS path of `name` inside the scope's data directory.
    #[must_use]
    pub fn data_path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}/{name}", self.data_dir))
    }

    /// Gateway-local path of `name` inside the scope's working directory.
    #[must_use]
    pub fn work_path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}/{name}", self.work_dir))
    }
}

/// Supplies identifiers for new scopes.
pub trait ScopeIdSource {
    /// Returns the identifier for the next scope.
    fn next_id(&self) -> u64;
}

impl<F: Fn() -> u64> ScopeIdSource for F {
    fn next_id(&self) -> u64 {
        self()
    }
}

/// Draws scope identifiers from the thread-local random generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomScopeIds;

impl ScopeIdSource for RandomScopeIds {
    fn next_id(&self) -> u64 {
        rand::random::<u64>()
    }
}

/// Errors raised while creating or deleting scopes.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScopeError {
    /// Raised when either scope directory cannot be created. The other
    /// directory may already exist.
    #[error("failed to create scope {id}: {source}")]
    Create {
        /// Identifier of the scope being created.
        id: u64,
        /// Underlying channel failure.
        #[source]
        source: ChannelError,
    },
    /// Raised when either scope directory cannot be removed.
    #[error("failed to delete scope {id}: {source}")]
    Delete {
        /// Identifier of the scope being deleted.
        id: u64,
        /// Underlying channel failure.
        #[source]
        source: ChannelError,
    },
}

/// Creates and removes scopes through a shared [`RemoteChannel`].
#[derive(Debug)]
pub struct ScopeManager<'c, T, I = RandomScopeIds> {
    channel: &'c RemoteChannel<T>,
    layout: ScopeLayout,
    hadoop_bin: String,
    ids: I,
}

impl<'c, T: Transport> ScopeManager<'c, T> {
    /// Creates a manager that draws random scope ids.
    #[must_use]
    pub fn new(
        channel: &'c RemoteChannel<T>,
        layout: ScopeLayout,
        hadoop_bin: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            layout,
            hadoop_bin: hadoop_bin.into(),
            ids: RandomScopeIds,
        }
    }
}

impl<'c, T: Transport, I: ScopeIdSource> ScopeManager<'c, T, I> {
    /// Replaces the id source, typically with a fixed sequence in tests.
    #[must_use]
    pub fn with_id_source<J: ScopeIdSource>(self, ids: J) -> ScopeManager<'c, T, J> {
        ScopeManager {
            channel: self.channel,
            layout: self.layout,
            hadoop_bin: self.hadoop_bin,
            ids,
        }
    }

    /// Allocates a new scope and creates its HDFS and local directories in
    /// one channel session.
    ///
    /// No rollback is attempted: if the local directory cannot be created
    /// the HDFS directory stays behind.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Create`] when either directory cannot be made.
    pub fn create_scope(&self) -> Result<Scope, ScopeError> {
        let scope = self.layout.resolve(self.ids.next_id());
        let make_data = RemoteCommand::new(format!("{} fs -mkdir -p", self.hadoop_bin))
            .arg(scope.data_dir().as_str());
        let make_work = RemoteCommand::new("mkdir -p").arg(scope.work_dir().as_str());

        self.channel
            .session(|session| {
                session.execute(&make_data)?;
                session.execute(&make_work)
            })
            .map_err(|source| ScopeError::Create {
                id: scope.id(),
                source,
            })?;

        info!(scope = scope.id(), data_dir = %scope.data_dir(), "created scope");
        Ok(scope)
    }

    /// Recursively removes both directories of scope `id`.
    ///
    /// Missing directories are not an error, so deleting an unknown id
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Delete`] when either removal fails.
    pub fn delete_scope(&self, id: u64) -> Result<(), ScopeError> {
        let scope = self.layout.resolve(id);
        let remove_data = RemoteCommand::new(format!("{} fs -rm -r -f", self.hadoop_bin))
            .arg(scope.data_dir().as_str());
        let remove_work = RemoteCommand::new("rm -rf").arg(scope.work_dir().as_str());

        self.channel
            .session(|session| {
                session.execute(&remove_data)?;
                session.execute(&remove_work)
            })
            .map_err(|source| ScopeError::Delete { id, source })?;

        info!(scope = id, "deleted scope");
        Ok(())
    }

    /// Resolves the paths of an existing scope without contacting the
    /// remote host.
    #[must_use]
    pub fn scope(&self, id: u64) -> Scope {
        self.layout.resolve(id)
    }
}
