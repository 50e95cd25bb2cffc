//! Command-line client for the tether configuration daemon.
//!
//! The module owns argument parsing, request encoding, the blocking daemon
//! exchange, and response forwarding. The interface is designed to be
//! exercised both from the binary entrypoint and from tests where IO
//! streams can be substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use tracing::debug;

use tether_config::Config;
use tether_protocol::{ClientError, DaemonClient, encode_request};

mod telemetry;

/// Tracing target for the client runtime.
const CLI_TARGET: &str = "tether_cli";

#[derive(Parser, Debug)]
#[command(
    name = "tether",
    version,
    disable_version_flag = true,
    about = "Forwards a command line to the tether configuration daemon."
)]
struct Cli {
    /// Prints the client version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
    /// Path of the daemon's listening socket.
    #[arg(short = 's', long = "socket", value_name = "PATH")]
    socket: Option<Utf8PathBuf>,
    /// Request tokens joined into one line for the daemon.
    #[arg(
        value_name = "TOKEN",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    tokens: Vec<String>,
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_parse_outcome(&error, stdout, stderr),
    };

    let mut config = Config::default();
    if let Some(socket) = cli.socket {
        config = config.with_socket_path(socket);
    }

    if let Err(error) = telemetry::initialise(&config) {
        writeln!(stderr, "{error}").ok();
        return ExitCode::FAILURE;
    }

    exchange(&config, &cli.tokens, stdout, stderr)
}

/// Help and version requests exit 0 on stdout; usage errors exit 2 on
/// stderr, matching clap's own convention.
fn report_parse_outcome<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        write!(stdout, "{rendered}").ok();
        stdout.flush().ok();
        ExitCode::SUCCESS
    } else {
        write!(stderr, "{rendered}").ok();
        ExitCode::from(2)
    }
}

/// Encodes the tokens, performs one daemon exchange, and forwards the
/// response lines to stdout.
fn exchange<W, E>(config: &Config, tokens: &[String], stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let request = encode_request(tokens);
    debug!(
        target: CLI_TARGET,
        %request,
        endpoint = %config.socket_path(),
        "forwarding request"
    );

    let mut client = DaemonClient::new(config.socket_path().to_owned());
    if let Err(error) = client.connect() {
        writeln!(stderr, "{error}").ok();
        return ExitCode::FAILURE;
    }
    if let Err(error) = client.send(&request) {
        writeln!(stderr, "{error}").ok();
        return ExitCode::FAILURE;
    }

    let exit = match client.receive() {
        Ok(lines) => {
            forward_lines(&lines, stdout);
            ExitCode::SUCCESS
        }
        Err(error) => {
            // Best-effort: forward whatever arrived before the failure.
            if let ClientError::Protocol { partial } = &error {
                forward_lines(partial, stdout);
            }
            writeln!(stderr, "{error}").ok();
            ExitCode::FAILURE
        }
    };
    client.close();
    exit
}

fn forward_lines<W: Write>(lines: &[String], stdout: &mut W) {
    for line in lines {
        writeln!(stdout, "{line}").ok();
    }
    stdout.flush().ok();
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail loudly on setup errors")]

    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn parses_socket_override_and_tokens() {
        let cli = parse(&["tether", "-s", "/run/tether/custom.sock", "get", "foo"])
            .expect("parse arguments");
        assert_eq!(
            cli.socket.as_deref().map(|path| path.as_str()),
            Some("/run/tether/custom.sock")
        );
        assert_eq!(cli.tokens, vec!["get", "foo"]);
    }

    #[test]
    fn zero_tokens_is_a_usage_error() {
        let error = parse(&["tether"]).expect_err("missing tokens must fail");
        assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = report_parse_outcome(&error, &mut stdout, &mut stderr);
        assert_eq!(code, ExitCode::from(2));
        assert!(stdout.is_empty());
        assert!(!stderr.is_empty());
    }

    #[test]
    fn version_flag_exits_successfully_on_stdout() {
        let error = parse(&["tether", "-v"]).expect_err("version is reported via clap");
        assert_eq!(error.kind(), ErrorKind::DisplayVersion);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = report_parse_outcome(&error, &mut stdout, &mut stderr);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(String::from_utf8(stdout).expect("utf8").contains("tether"));
        assert!(stderr.is_empty());
    }

    #[rstest]
    #[case::plain(&["tether", "get", "foo"], &["get", "foo"])]
    #[case::double_dash(&["tether", "--", "del", "foo"], &["del", "foo"])]
    #[case::hyphen_values(&["tether", "set", "--force", "1"], &["set", "--force", "1"])]
    fn collects_request_tokens(#[case] args: &[&str], #[case] expected: &[&str]) {
        let cli = parse(args).expect("parse arguments");
        assert_eq!(cli.tokens, expected);
    }

    #[test]
    fn connect_failure_exits_nonzero_with_a_message() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let config = Config::default().with_socket_path("/nonexistent/tetherd.sock");
        let code = exchange(
            &config,
            &[String::from("get"), String::from("foo")],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, ExitCode::FAILURE);
        assert!(stdout.is_empty());
        assert!(
            String::from_utf8(stderr)
                .expect("utf8")
                .contains("failed to connect")
        );
    }
}
