//! Command-line interface definitions for the `mrgate` binary.
//!
//! The parser structures live here so both the binary and the build script
//! can use them; the build script renders the manual page from them.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI for the `mrgate` binary.
#[derive(Debug, Parser)]
#[command(
    name = "mrgate",
    version,
    about = "Share one Hadoop gateway host between isolated clients over SSH",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    /// Operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Operations offered by the gateway.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Create a scope and print it as JSON.
    #[command(name = "create-scope")]
    CreateScope,
    /// Remove both directories of a scope.
    #[command(name = "delete-scope")]
    DeleteScope {
        /// Scope identifier.
        id: u64,
    },
    /// Upload a jar and run it with `yarn jar`.
    #[command(name = "run-jar")]
    RunJar(RunJarCommand),
    /// Run a Hadoop streaming job with script mapper and reducer.
    #[command(name = "run-streaming")]
    RunStreaming(RunStreamingCommand),
    /// Import the rows of a SELECT into the scope with sqoop.
    #[command(name = "import")]
    Import(ImportCommand),
    /// Export a scope directory into a database table with sqoop.
    #[command(name = "export")]
    Export(ExportCommand),
}

/// Arguments for `mrgate run-jar`.
#[derive(Debug, Args)]
pub(crate) struct RunJarCommand {
    /// Scope identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) scope: u64,
    /// Local jar to upload.
    #[arg(value_name = "JAR")]
    pub(crate) jar: PathBuf,
    /// Arguments passed to the jar after the scope's data directory.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub(crate) args: Vec<String>,
}

/// Arguments for `mrgate run-streaming`.
#[derive(Debug, Args)]
pub(crate) struct RunStreamingCommand {
    /// Scope identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) scope: u64,
    /// Local mapper script.
    #[arg(long, value_name = "FILE")]
    pub(crate) mapper: PathBuf,
    /// Local reducer script.
    #[arg(long, value_name = "FILE")]
    pub(crate) reducer: PathBuf,
    /// Input directory name inside the scope.
    #[arg(long, value_name = "NAME")]
    pub(crate) input: String,
    /// Output directory name inside the scope.
    #[arg(long, value_name = "NAME")]
    pub(crate) output: String,
}

/// Database connection flags shared by import and export.
#[derive(Debug, Args)]
pub(crate) struct ConnectionArgs {
    /// JDBC connection URI.
    #[arg(long, value_name = "URI")]
    pub(crate) connect: String,
    /// Database user.
    #[arg(long, value_name = "USER")]
    pub(crate) username: String,
    /// Database password.
    #[arg(long, value_name = "PASSWORD", env = "MRGATE_DB_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

/// Arguments for `mrgate import`.
#[derive(Debug, Args)]
pub(crate) struct ImportCommand {
    /// Scope identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) scope: u64,
    /// Source database.
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    /// SELECT statement producing the imported rows.
    #[arg(long, value_name = "SQL")]
    pub(crate) query: String,
    /// Split column, qualified by its table.
    #[arg(long, value_name = "TABLE.COLUMN")]
    pub(crate) split_by: String,
    /// Target directory name inside the scope.
    #[arg(long, value_name = "NAME")]
    pub(crate) target: String,
}

/// Arguments for `mrgate export`.
#[derive(Debug, Args)]
pub(crate) struct ExportCommand {
    /// Scope identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) scope: u64,
    /// Target database.
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    /// Database table receiving the rows.
    #[arg(long, value_name = "TABLE")]
    pub(crate) table: String,
    /// Source directory name inside the scope.
    #[arg(long, value_name = "NAME")]
    pub(crate) source: String,
}
