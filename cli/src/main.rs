use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use args::CliArgs;
use clap::Parser;
use pocket_core::{AccessToken, AuthorizationGate, PocketClient, SavesRetriever};
use prompt::ConsolePrompt;
use tracing::info;
use transport::UreqTransport;

mod args;
mod logging;
mod output;
mod prompt;
mod transport;

fn main() -> ExitCode {
    // A missing .env is fine; the environment or flags may carry everything.
    let _ = dotenvy::dotenv();
    let cli_args = CliArgs::parse();
    logging::init(cli_args.verbose);

    let mut gate = ConsolePrompt::stdio(cli_args.open_browser);
    match run(&cli_args, &mut gate, &mut io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    cli_args: &CliArgs,
    gate: &mut impl AuthorizationGate,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let client = PocketClient::new(&cli_args.base_url);
    let transport = UreqTransport::new(Duration::from_secs(cli_args.timeout));

    let retriever = match &cli_args.access_token {
        Some(token) => {
            info!("using access token from the command line");
            SavesRetriever::with_access_token(
                client,
                cli_args.credentials(),
                transport,
                AccessToken::new(token.as_str(), ""),
            )
        }
        None => {
            let mut retriever = SavesRetriever::new(client, cli_args.credentials(), transport);
            let access = retriever
                .authenticate(gate)
                .context("authentication failed")?;
            writeln!(out)?;
            writeln!(out, "Authenticated as {}", access.username())?;
            if cli_args.show_token {
                writeln!(out, "Access token: {}", access.as_str())?;
            }
            retriever
        }
    };

    let items = retriever
        .fetch(&cli_args.query())
        .context("fetching saved items failed")?;
    output::print_items(out, &items)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_server::{Provider, TEST_CONSUMER_KEY};
    use pocket_core::{ApiError, HttpMethod, HttpRequest, Transport};
    use url::Url;

    /// Opens the authorization page instead of waiting for a human.
    struct ClickThrough;

    impl AuthorizationGate for ClickThrough {
        fn wait_for_approval(&mut self, authorize_url: &Url) -> Result<(), ApiError> {
            UreqTransport::new(Duration::from_secs(5)).execute(HttpRequest {
                method: HttpMethod::Get,
                path: authorize_url.to_string(),
                headers: Vec::new(),
                body: None,
            })?;
            Ok(())
        }
    }

    fn start_server() -> String {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener, Provider::seeded()).await
            })
            .unwrap();
        });

        format!("http://{addr}")
    }

    fn args(base_url: &str, consumer_key: &str, extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "pocket-saves",
            "--consumer-key",
            consumer_key,
            "--base-url",
            base_url,
        ];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn lists_items_after_handshake() {
        let base_url = start_server();
        let mut out = Vec::new();
        run(
            &args(&base_url, TEST_CONSUMER_KEY, &["--state", "all", "--sort", "newest"]),
            &mut ClickThrough,
            &mut out,
        )
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Authenticated as pocketuser"), "{printed}");
        assert!(printed.contains("Title: Rust Book, URL: https://doc.rust-lang.org/book/"));
        assert!(printed.contains("Title: Axum"));
        assert!(!printed.contains("Access token:"));
    }

    #[test]
    fn rejected_key_reports_failing_stage() {
        let base_url = start_server();
        let err = run(
            &args(&base_url, "unknown-key", &[]),
            &mut ClickThrough,
            &mut Vec::<u8>::new(),
        )
        .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.starts_with("authentication failed"), "{message}");
        assert!(message.contains("request token denied (HTTP 403)"), "{message}");
    }

    #[test]
    fn invalid_access_token_fails_retrieval() {
        let base_url = start_server();
        let err = run(
            &args(&base_url, TEST_CONSUMER_KEY, &["--access-token", "stale"]),
            &mut ClickThrough,
            &mut Vec::<u8>::new(),
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("HTTP 401"));
    }
}
