use std::io::{self, BufRead, Write};

use pocket_core::{ApiError, AuthorizationGate};
use tracing::warn;
use url::Url;

/// Shows the authorization URL and blocks until the user presses Enter.
///
/// There is no timeout: the process waits for as long as the user takes.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
    open_browser: bool,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(open_browser: bool) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), open_browser)
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W, open_browser: bool) -> Self {
        Self {
            input,
            output,
            open_browser,
        }
    }

    fn prompt(&mut self, authorize_url: &Url) -> io::Result<usize> {
        writeln!(self.output, "Visit the following URL to authorize the app:")?;
        writeln!(self.output, "{authorize_url}")?;
        if self.open_browser {
            if let Err(err) = opener::open(authorize_url.as_str()) {
                warn!(%err, "could not open a browser");
                writeln!(self.output, "Browser didn't open? Use the URL above.")?;
            }
        }
        write!(self.output, "Press Enter after authorizing the app...")?;
        self.output.flush()?;
        self.input.read_line(&mut String::new())
    }
}

impl<R: BufRead, W: Write> AuthorizationGate for ConsolePrompt<R, W> {
    fn wait_for_approval(&mut self, authorize_url: &Url) -> Result<(), ApiError> {
        match self.prompt(authorize_url) {
            Ok(0) => Err(ApiError::Authorization(
                "input closed before authorization was confirmed".to_string(),
            )),
            Ok(_) => Ok(()),
            Err(err) => Err(ApiError::Authorization(err.to_string())),
        }
    }
}
