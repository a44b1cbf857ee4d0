use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::encoders::escape::quote_plus;
use crate::runners::{RunContext, RunError, RunOutcome};
use crate::stage::{ParamDefault, ParamSpec, ParamType, Params, Runner, StageError, StageType};

/// POST the command to a web endpoint and return the response body.
///
/// The HTTP status is not interpreted: an error page is output like any
/// other.
#[derive(Debug, Clone)]
pub struct WebRunner {
    url: String,
    data: String,
    replace: String,
    timeout: Option<u64>,
}

impl WebRunner {
    fn http_error(&self, source: reqwest::Error) -> RunError {
        RunError::Http {
            url: self.url.clone(),
            source,
        }
    }
}

impl StageType for WebRunner {
    const NAME: &'static str = "WebRunner";
    const HELP: &'static str = "Posts the form-encoded command to a URL, spliced into the data \
                                template in place of the placeholder, and returns the response body.";
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::required("url", ParamType::Text, "Target URL"),
        ParamSpec::required("data", ParamType::Text, "POST body template"),
        ParamSpec::optional(
            "replace",
            ParamType::Text,
            ParamDefault::Text("***"),
            "Placeholder in the data template replaced by the command",
        ),
        ParamSpec::optional(
            "timeout",
            ParamType::Integer,
            ParamDefault::Int(30),
            "Request timeout in seconds; none disables",
        )
        .nullable(),
    ];

    fn from_params(params: &Params) -> Result<Self, StageError> {
        Ok(Self {
            url: params.text("url")?,
            data: params.text("data")?,
            replace: params.text("replace")?,
            timeout: params.opt_unsigned("timeout")?,
        })
    }
}

impl Runner for WebRunner {
    fn encode(&self, command: &str) -> String {
        quote_plus(command)
    }

    fn run(&self, command: &str, _ctx: &RunContext) -> Result<RunOutcome, RunError> {
        let client = Client::builder()
            .timeout(self.timeout.map(Duration::from_secs))
            .build()
            .map_err(|e| self.http_error(e))?;

        let body = self.data.replace(&self.replace, command);
        info!(url = %self.url, bytes = body.len(), "Posting command");

        let response = client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .map_err(|e| self.http_error(e))?;
        debug!(status = %response.status(), "Response received");

        let text = response.text().map_err(|e| self.http_error(e))?;
        Ok(RunOutcome::completed(text))
    }
}
