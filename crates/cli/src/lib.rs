#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the thin command-line front-end for blobsync. It recognises
//! the publishing flags (`--endpoint`, `--publisher`, `--identity`,
//! `--config`, `--secret-env`, `--concurrency`, `--require`,
//! `--timeout`, `--delete`, `--dry-run`, `-v`, `--quiet`), merges them
//! over the optional `blobsync.json` project configuration, and
//! delegates the actual run to [`core::run_sync`].
//!
//! # Design
//!
//! [`run_with`] is the single entry point. It accepts an argument
//! iterator together with handles for standard output and error, so the
//! binary and the test suite drive one execution path. Reports go to
//! stdout; every diagnostic goes to stderr. Logging is initialised from
//! the verbosity flags through `tracing-subscriber`'s env-filter, and
//! `RUST_LOG` overrides the flag-derived default.
//!
//! # Invariants
//!
//! - [`run_with`] never panics; every failure maps to a
//!   [`core::ExitCode`].
//! - Command-line flags override project-config fields one by one; a
//!   repeated `--endpoint` replaces the configured endpoint set as a
//!   whole.
//! - The signing secret is only ever read from the environment, never
//!   from an argument, so it cannot leak into process listings.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Arg, ArgAction, Command};
use url::Url;

use core::{
    ClientError, ExitCode, ProjectConfig, Session, SyncOptions, SyncSummary, run_sync,
};
use engine::DEFAULT_CONCURRENCY;
use remote::{Endpoint, HmacSigner, HttpBlobStore, HttpPublisher, Identity};

/// Environment variable consulted for the signing secret by default.
pub const DEFAULT_SECRET_VAR: &str = "BLOBSYNC_SECRET";

/// Parsed command line, numeric values still raw.
#[derive(Debug, Default)]
struct ParsedArgs {
    root: PathBuf,
    endpoints: Vec<String>,
    publisher: Option<String>,
    identity: Option<String>,
    config: Option<PathBuf>,
    secret_env: String,
    concurrency: Option<String>,
    require: Option<String>,
    timeout: Option<String>,
    delete: bool,
    dry_run: bool,
    verbose: u8,
    quiet: bool,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("blobsync")
        .about("Publishes a directory as content-addressed blobs with redundant storage")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("root")
                .value_name("ROOT")
                .required(true)
                .help("Directory to publish."),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("URL")
                .action(ArgAction::Append)
                .help("Blob-store endpoint; repeat for redundancy. Replaces the configured set."),
        )
        .arg(
            Arg::new("publisher")
                .long("publisher")
                .value_name("URL")
                .action(ArgAction::Set)
                .help("Pointer-directory base URL."),
        )
        .arg(
            Arg::new("identity")
                .long("identity")
                .value_name("HEX")
                .action(ArgAction::Set)
                .help("Owner identity records are published under."),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .action(ArgAction::Set)
                .help("Project config path. Defaults to ROOT/blobsync.json when present."),
        )
        .arg(
            Arg::new("secret-env")
                .long("secret-env")
                .value_name("VAR")
                .action(ArgAction::Set)
                .default_value(DEFAULT_SECRET_VAR)
                .help("Environment variable holding the HMAC signing secret."),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .value_name("N")
                .action(ArgAction::Set)
                .help(format!(
                    "Files in flight at once (default {DEFAULT_CONCURRENCY})."
                )),
        )
        .arg(
            Arg::new("require")
                .long("require")
                .value_name("N")
                .action(ArgAction::Set)
                .help("Endpoints that must store a file for it to count as uploaded (default 1)."),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .action(ArgAction::Set)
                .help("Per-endpoint attempt deadline in seconds."),
        )
        .arg(
            Arg::new("delete")
                .long("delete")
                .action(ArgAction::SetTrue)
                .help("Retract published paths that no longer exist locally."),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .short('n')
                .action(ArgAction::SetTrue)
                .help("Classify only; perform no uploads, publishes, or deletions."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Increase log verbosity; repeatable."),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Log errors only."),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("blobsync"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        root: PathBuf::from(matches.remove_one::<String>("root").unwrap_or_default()),
        endpoints: matches
            .remove_many::<String>("endpoint")
            .map(|values| values.collect())
            .unwrap_or_default(),
        publisher: matches.remove_one::<String>("publisher"),
        identity: matches.remove_one::<String>("identity"),
        config: matches.remove_one::<String>("config").map(PathBuf::from),
        secret_env: matches
            .remove_one::<String>("secret-env")
            .unwrap_or_else(|| DEFAULT_SECRET_VAR.to_owned()),
        concurrency: matches.remove_one::<String>("concurrency"),
        require: matches.remove_one::<String>("require"),
        timeout: matches.remove_one::<String>("timeout"),
        delete: matches.get_flag("delete"),
        dry_run: matches.get_flag("dry-run"),
        verbose: matches.get_count("verbose"),
        quiet: matches.get_flag("quiet"),
    })
}

/// Fully resolved invocation: flags merged over the project config.
#[derive(Debug)]
struct Settings {
    root: PathBuf,
    identity: Identity,
    publisher: Url,
    endpoints: Vec<Endpoint>,
    options: SyncOptions,
    secret_env: String,
}

fn parse_count(flag: &str, raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        Ok(_) => Err(format!("{flag} must be at least 1")),
        Err(err) => Err(format!("invalid {flag} value {raw:?}: {err}")),
    }
}

fn parse_secs(flag: &str, raw: &str) -> Result<u64, String> {
    match raw.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(value),
        Ok(_) => Err(format!("{flag} must be at least 1 second")),
        Err(err) => Err(format!("invalid {flag} value {raw:?}: {err}")),
    }
}

/// Merges parsed flags over the optional project config.
fn resolve_settings(
    args: ParsedArgs,
    config: Option<ProjectConfig>,
) -> Result<Settings, String> {
    let ParsedArgs {
        root,
        endpoints,
        publisher,
        identity,
        secret_env,
        concurrency,
        require,
        timeout,
        delete,
        dry_run,
        ..
    } = args;

    let identity = identity
        .map(Identity::new)
        .or_else(|| config.as_ref().map(|c| c.identity.clone()))
        .ok_or_else(|| {
            "an identity is required (--identity or the project config)".to_owned()
        })?;

    let publisher = match publisher {
        Some(raw) => Url::parse(&raw)
            .map_err(|err| format!("invalid --publisher URL {raw:?}: {err}"))?,
        None => config
            .as_ref()
            .map(|c| c.publisher.clone())
            .ok_or_else(|| {
                "a publisher URL is required (--publisher or the project config)".to_owned()
            })?,
    };

    let endpoints = if endpoints.is_empty() {
        config
            .as_ref()
            .map(|c| c.endpoints.clone())
            .unwrap_or_default()
    } else {
        let mut parsed = Vec::with_capacity(endpoints.len());
        for raw in endpoints {
            parsed.push(
                Endpoint::parse(&raw)
                    .map_err(|err| format!("invalid --endpoint URL: {err}"))?,
            );
        }
        parsed
    };
    if endpoints.is_empty() {
        return Err(
            "at least one blob-store endpoint is required (--endpoint or the project config)"
                .to_owned(),
        );
    }

    let mut options = SyncOptions {
        delete,
        dry_run,
        ..SyncOptions::default()
    };
    if let Some(raw) = concurrency {
        options.concurrency = parse_count("--concurrency", &raw)?;
    } else if let Some(value) = config.as_ref().and_then(|c| c.concurrency) {
        options.concurrency = value.max(1);
    }
    if let Some(raw) = require {
        options.required_endpoints = parse_count("--require", &raw)?;
    }
    let timeout_secs = match timeout {
        Some(raw) => Some(parse_secs("--timeout", &raw)?),
        None => config.as_ref().and_then(|c| c.endpoint_timeout_secs),
    };
    options.endpoint_timeout = timeout_secs.map(Duration::from_secs);

    Ok(Settings {
        root,
        identity,
        publisher,
        endpoints,
        options,
        secret_env,
    })
}

/// The env-filter directive derived from the verbosity flags.
fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive(verbose, quiet)));
    // try_init fails when a subscriber is already set, which is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn load_config(args: &ParsedArgs) -> Result<Option<ProjectConfig>, ClientError> {
    match &args.config {
        Some(path) => ProjectConfig::load(path).map(Some),
        None => ProjectConfig::discover(&args.root),
    }
}

fn render_clap_error<Out, Err>(error: &clap::Error, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    Out: Write,
    Err: Write,
{
    use clap::error::ErrorKind;
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(stdout, "{error}");
            ExitCode::Ok
        }
        _ => {
            let _ = write!(stderr, "{error}");
            ExitCode::Usage
        }
    }
}

/// Writes the plain final tally, one line per class.
fn render_summary<Out: Write>(summary: &SyncSummary, settings: &Settings, stdout: &mut Out) {
    let _ = writeln!(
        stdout,
        "scanned {} files under {}",
        summary.scanned,
        settings.root.display()
    );
    let _ = writeln!(
        stdout,
        "  transfer: {}   unchanged: {}   delete: {}",
        summary.to_transfer, summary.unchanged, summary.to_delete
    );
    if let Some(upload) = &summary.upload {
        let _ = writeln!(
            stdout,
            "  uploaded: {} succeeded, {} failed",
            upload.successful, upload.failed
        );
        for outcome in &upload.outcomes {
            if !outcome.success {
                let _ = writeln!(
                    stdout,
                    "    failed {} ({} of {} endpoints stored)",
                    outcome.path, outcome.stored, outcome.attempted
                );
            }
        }
    }
    if let Some(purge) = &summary.purge {
        let _ = writeln!(
            stdout,
            "  purged: {} retracted, {} delete failures, {} retract failures, {} skipped",
            purge.retracted, purge.delete_failures, purge.retract_failures, purge.skipped
        );
    }
    if settings.options.dry_run {
        let _ = writeln!(stdout, "  dry run: nothing uploaded, published, or deleted");
    }
}

/// Runs the blobsync command line and returns its exit code.
///
/// Accepts the argument iterator together with the output handles so
/// the binary and tests drive the same path. The function parses and
/// resolves the invocation, builds the HTTP collaborators and the
/// tokio runtime, drives [`core::run_sync`], and renders the final
/// tally to `stdout`.
#[must_use]
pub fn run_with<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => return render_clap_error(&error, stdout, stderr),
    };

    init_logging(parsed.verbose, parsed.quiet);

    let config = match load_config(&parsed) {
        Ok(config) => config,
        Err(err) => {
            let _ = writeln!(stderr, "blobsync: {err}");
            return err.exit_code();
        }
    };
    let settings = match resolve_settings(parsed, config) {
        Ok(settings) => settings,
        Err(message) => {
            let _ = writeln!(stderr, "blobsync: {message}");
            return ExitCode::Usage;
        }
    };

    let secret = match std::env::var(&settings.secret_env) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            let _ = writeln!(
                stderr,
                "blobsync: environment variable {} must hold the signing secret",
                settings.secret_env
            );
            return ExitCode::Usage;
        }
    };

    // One client, so blob and record traffic share a connection pool.
    let client = reqwest::Client::new();
    let session = Session::new(
        settings.identity.clone(),
        settings.endpoints.clone(),
        Arc::new(HttpBlobStore::with_client(client.clone())),
        Arc::new(HttpPublisher::with_client(client, settings.publisher.clone())),
        Arc::new(HmacSigner::new(secret.into_bytes())),
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = writeln!(stderr, "blobsync: cannot start the async runtime: {err}");
            return ExitCode::Usage;
        }
    };

    match runtime.block_on(run_sync(&session, &settings.root, &settings.options)) {
        Ok(summary) => {
            render_summary(&summary, &settings, stdout);
            summary.exit_code()
        }
        Err(err) => {
            let _ = writeln!(stderr, "blobsync: {err}");
            err.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with_args<I, S>(args: I) -> (ExitCode, Vec<u8>, Vec<u8>)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(args, &mut stdout, &mut stderr);
        (code, stdout, stderr)
    }

    #[test]
    fn version_flag_prints_the_version() {
        let (code, stdout, stderr) = run_with_args(["blobsync", "--version"]);
        assert_eq!(code, ExitCode::Ok);
        assert!(String::from_utf8(stdout).unwrap().contains(env!("CARGO_PKG_VERSION")));
        assert!(stderr.is_empty());
    }

    #[test]
    fn help_flag_documents_the_surface() {
        let (code, stdout, stderr) = run_with_args(["blobsync", "--help"]);
        assert_eq!(code, ExitCode::Ok);
        let help = String::from_utf8(stdout).unwrap();
        assert!(help.contains("--endpoint"));
        assert!(help.contains("--delete"));
        assert!(help.contains("--secret-env"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn missing_root_is_a_usage_error() {
        let (code, stdout, stderr) = run_with_args(["blobsync"]);
        assert_eq!(code, ExitCode::Usage);
        assert!(stdout.is_empty());
        assert!(!stderr.is_empty());
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let (code, _, stderr) = run_with_args(["blobsync", "--definitely-invalid", "/site"]);
        assert_eq!(code, ExitCode::Usage);
        assert!(!stderr.is_empty());
    }

    #[test]
    fn non_numeric_concurrency_is_a_usage_error() {
        let (code, _, stderr) = run_with_args([
            "blobsync",
            "--identity",
            "ab12",
            "--publisher",
            "https://records.example/",
            "--endpoint",
            "https://blob1.example/",
            "--concurrency",
            "lots",
            "/site",
        ]);
        assert_eq!(code, ExitCode::Usage);
        assert!(String::from_utf8(stderr).unwrap().contains("--concurrency"));
    }

    fn parsed(args: &[&str]) -> ParsedArgs {
        let mut full = vec!["blobsync"];
        full.extend_from_slice(args);
        parse_args(full).unwrap()
    }

    fn sample_config() -> ProjectConfig {
        ProjectConfig {
            identity: Identity::new("config-owner"),
            publisher: Url::parse("https://records.example/").unwrap(),
            endpoints: vec![
                Endpoint::parse("https://config1.example/").unwrap(),
                Endpoint::parse("https://config2.example/").unwrap(),
            ],
            concurrency: Some(2),
            endpoint_timeout_secs: Some(15),
        }
    }

    #[test]
    fn config_supplies_everything_flags_leave_out() {
        let settings = resolve_settings(parsed(&["/site"]), Some(sample_config())).unwrap();
        assert_eq!(settings.identity.as_str(), "config-owner");
        assert_eq!(settings.publisher.as_str(), "https://records.example/");
        assert_eq!(settings.endpoints.len(), 2);
        assert_eq!(settings.options.concurrency, 2);
        assert_eq!(
            settings.options.endpoint_timeout,
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn flags_override_the_project_config() {
        let settings = resolve_settings(
            parsed(&[
                "--identity",
                "flag-owner",
                "--endpoint",
                "https://flag.example/",
                "--concurrency",
                "9",
                "--timeout",
                "3",
                "/site",
            ]),
            Some(sample_config()),
        )
        .unwrap();
        assert_eq!(settings.identity.as_str(), "flag-owner");
        // A single --endpoint replaces the whole configured set.
        assert_eq!(settings.endpoints.len(), 1);
        assert_eq!(settings.options.concurrency, 9);
        assert_eq!(
            settings.options.endpoint_timeout,
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn missing_identity_is_rejected() {
        let err = resolve_settings(
            parsed(&[
                "--publisher",
                "https://records.example/",
                "--endpoint",
                "https://blob1.example/",
                "/site",
            ]),
            None,
        )
        .unwrap_err();
        assert!(err.contains("identity"));
    }

    #[test]
    fn missing_endpoints_are_rejected() {
        let err = resolve_settings(
            parsed(&[
                "--identity",
                "ab12",
                "--publisher",
                "https://records.example/",
                "/site",
            ]),
            None,
        )
        .unwrap_err();
        assert!(err.contains("endpoint"));
    }

    #[test]
    fn delete_and_dry_run_flags_carry_through() {
        let settings = resolve_settings(
            parsed(&[
                "--identity",
                "ab12",
                "--publisher",
                "https://records.example/",
                "--endpoint",
                "https://blob1.example/",
                "--delete",
                "--dry-run",
                "/site",
            ]),
            None,
        )
        .unwrap();
        assert!(settings.options.delete);
        assert!(settings.options.dry_run);
        assert!(!settings.options.parallel_purge);
    }

    #[test]
    fn verbosity_maps_to_filter_directives() {
        assert_eq!(default_directive(0, false), "warn");
        assert_eq!(default_directive(1, false), "info");
        assert_eq!(default_directive(2, false), "debug");
        assert_eq!(default_directive(3, false), "trace");
        assert_eq!(default_directive(5, false), "trace");
        assert_eq!(default_directive(0, true), "error");
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(parse_count("--concurrency", "0").is_err());
        assert_eq!(parse_count("--concurrency", "4").unwrap(), 4);
    }
}
