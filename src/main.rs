//! Binary entry point for the `mrgate` CLI.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;

use mrgate::{
    ConfigError, ConnectionSpec, GatewayConfig, ImportSpec, JobError, JobSubmitter, RemoteChannel,
    ScopeError, ScopeManager, SshTransport, SystemClientRunner,
};

mod cli;

use cli::{Cli, Command, ConnectionArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
    #[error("failed to read {path}: {message}")]
    ReadFile { path: Utf8PathBuf, message: String },
    #[error("failed to write output: {0}")]
    Output(String),
}

fn main() {
    let cli = Cli::parse();
    mrgate::logging::init_tracing(cli.verbose);

    let exit_code = match dispatch(cli.command) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn dispatch(command: Command) -> Result<(), CliError> {
    let config = GatewayConfig::load_without_cli_args()?;
    config.validate()?;

    let transport = SshTransport::new(config.ssh_settings(), SystemClientRunner);
    let channel = RemoteChannel::new(transport);
    let scopes = ScopeManager::new(&channel, config.scope_layout(), &config.hadoop_bin);
    let jobs = JobSubmitter::new(&channel, config.cluster_tools());

    match command {
        Command::CreateScope => {
            let scope = scopes.create_scope()?;
            let json =
                serde_json::to_string(&scope).map_err(|err| CliError::Output(err.to_string()))?;
            writeln!(io::stdout(), "{json}").map_err(|err| CliError::Output(err.to_string()))
        }
        Command::DeleteScope { id } => scopes.delete_scope(id).map_err(CliError::from),
        Command::RunJar(args) => {
            let jar = utf8_path(args.jar)?;
            jobs.run_jar(&scopes.scope(args.scope), &jar, &args.args)
                .map_err(CliError::from)
        }
        Command::RunStreaming(args) => {
            let mapper = read_file(&utf8_path(args.mapper)?)?;
            let reducer = read_file(&utf8_path(args.reducer)?)?;
            jobs.run_streaming_job(
                &scopes.scope(args.scope),
                &mapper,
                &reducer,
                &args.input,
                &args.output,
            )
            .map_err(CliError::from)
        }
        Command::Import(args) => {
            let spec = ImportSpec {
                connection: connection_spec(args.connection),
                query: args.query,
                partition_column: args.split_by,
                destination: args.target,
            };
            jobs.import_from_rdbms(&scopes.scope(args.scope), &spec)
                .map_err(CliError::from)
        }
        Command::Export(args) => jobs
            .export_to_rdbms(
                &scopes.scope(args.scope),
                &connection_spec(args.connection),
                &args.table,
                &args.source,
            )
            .map_err(CliError::from),
    }
}

fn connection_spec(args: ConnectionArgs) -> ConnectionSpec {
    ConnectionSpec {
        uri: args.connect,
        user: args.username,
        credentials: args.password,
    }
}

fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf, CliError> {
    Utf8PathBuf::from_path_buf(path).map_err(|raw| CliError::NonUtf8Path(raw.display().to_string()))
}

fn read_file(path: &Utf8Path) -> Result<String, CliError> {
    let read_error = |message: String| CliError::ReadFile {
        path: path.to_path_buf(),
        message,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(String::from("path has no file name")))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| read_error(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "error: {err}").ok();
}
