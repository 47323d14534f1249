use clap::{ArgAction, Parser};
use pocket_core::{
    Credentials, DetailType, ItemState, RetrieveQuery, Sort, DEFAULT_BASE_URL,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Consumer key (https://getpocket.com/developer/apps/new)
    #[arg(long, env = "CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: String,

    /// Callback marker sent with the request token
    #[arg(long, env = "REDIRECT_URI", default_value = "https://getpocket.com")]
    pub redirect_uri: String,

    /// Provider host, for pointing at a stand-in server
    #[arg(long, env = "POCKET_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Skip the handshake and use this access token
    #[arg(long, env = "POCKET_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Which items to list: unread, archive or all
    #[arg(long, default_value_t = ItemState::Unread)]
    pub state: ItemState,

    /// Maximum number of items to list
    #[arg(long, default_value_t = RetrieveQuery::DEFAULT_COUNT)]
    pub count: u32,

    /// Number of items to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// newest, oldest, title or site
    #[arg(long)]
    pub sort: Option<Sort>,

    /// simple or complete
    #[arg(long)]
    pub detail_type: Option<DetailType>,

    /// Open the authorization page in the default browser
    #[arg(long, action = ArgAction::SetTrue)]
    pub open_browser: bool,

    /// Print the access token once the handshake completes
    #[arg(long, action = ArgAction::SetTrue)]
    pub show_token: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Turn debugging information on (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.consumer_key, &self.redirect_uri)
    }

    pub fn query(&self) -> RetrieveQuery {
        let mut query = RetrieveQuery::default()
            .with_state(self.state)
            .with_count(self.count)
            .with_offset(self.offset);
        if let Some(sort) = self.sort {
            query = query.with_sort(sort);
        }
        if let Some(detail_type) = self.detail_type {
            query = query.with_detail_type(detail_type);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["pocket-saves", "--consumer-key", "key", "--base-url", "http://x"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_fetch_first_hundred_unread() {
        let args = parse(&[]);
        assert_eq!(args.query(), RetrieveQuery::default());
        assert!(!args.open_browser);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn query_options_are_carried_over() {
        let args = parse(&[
            "--state",
            "all",
            "--count",
            "50",
            "--offset",
            "100",
            "--sort",
            "newest",
            "--detail-type",
            "complete",
        ]);
        let query = args.query();
        assert_eq!(query.state, ItemState::All);
        assert_eq!(query.count, 50);
        assert_eq!(query.offset, 100);
        assert_eq!(query.sort, Some(Sort::Newest));
        assert_eq!(query.detail_type, Some(DetailType::Complete));
    }

    #[test]
    fn unknown_state_is_rejected() {
        let result = CliArgs::try_parse_from([
            "pocket-saves",
            "--consumer-key",
            "key",
            "--state",
            "deleted",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
    }

    #[test]
    fn credentials_use_redirect_uri() {
        let args = parse(&["--redirect-uri", "app:done"]);
        let credentials = args.credentials();
        assert_eq!(credentials.consumer_key, "key");
        assert_eq!(credentials.redirect_uri, "app:done");
    }
}
