//! Client for the external receipt/message parsing service.
//!
//! The AI model that turns free text (or a receipt caption) into splits is a
//! separate deployment; the bot only ships the text and the list of names
//! the model is allowed to use, and gets structured splits back.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub(crate) struct ParserClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ParserError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Service { status: StatusCode, message: String },
}

/// One split extracted by the parser: `from_friend` paid for `to_friend`.
#[derive(Debug, Deserialize)]
pub(crate) struct ParsedSplit {
    pub from_friend: String,
    pub to_friend: String,
    /// Major-unit decimal string, e.g. `"12.50"`.
    pub amount: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParsedExpenses {
    #[serde(default)]
    pub transactions: Vec<ParsedSplit>,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    input_type: &'a str,
    text: &'a str,
    possible_friends: &'a [String],
}

impl ParserClient {
    pub(crate) fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub(crate) async fn parse_text(
        &self,
        text: &str,
        possible_friends: &[String],
    ) -> Result<ParsedExpenses, ParserError> {
        let url = format!("{}/parse", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(url)
            .json(&ParseRequest {
                input_type: "text",
                text,
                possible_friends,
            })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<ParsedExpenses>().await?);
        }

        let message = resp.text().await.unwrap_or_else(|_| "parser error".to_string());
        Err(ParserError::Service { status, message })
    }
}
