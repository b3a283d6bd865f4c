//! Telegram bot.
//!
//! The bot is a thin client: it talks only to the HTTP server API and never
//! accesses the database directly. Receipt parsing and crypto payments are
//! reached through their own HTTP clients and stay optional.

use base64::Engine;
use reqwest::{Client, Url, header};
use teloxide::prelude::*;

mod api;
mod crypto_pay;
mod handlers;
mod parser;
mod parsing;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    api: api::ApiClient,
    pay: Option<crypto_pay::CryptoPayClient>,
    parser: Option<parser::ParserClient>,
    miniapp_url: Option<Url>,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    server: String,
    client: Client,
    pay: Option<crypto_pay::CryptoPayClient>,
    parser: Option<parser::ParserClient>,
    miniapp_url: Option<Url>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            api: api::ApiClient::new(self.client.clone(), self.server.clone()),
            pay: self.pay.clone(),
            parser: self.parser.clone(),
            miniapp_url: self.miniapp_url.clone(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    server: String,
    username: String,
    password: String,
    miniapp_url: Option<String>,
    crypto_pay_token: Option<String>,
    crypto_pay_api_base: Option<String>,
    parser_url: Option<String>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn allowed_users(mut self, allowed_users: Vec<u64>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users.into_iter().map(UserId).collect());
        }
        self
    }

    pub fn server(mut self, server: &str, username: &str, password: &str) -> BotBuilder {
        self.server = server.to_string();
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn miniapp_url(mut self, url: &str) -> BotBuilder {
        self.miniapp_url = Some(url.to_string());
        self
    }

    pub fn crypto_pay(mut self, token: &str, api_base: Option<&str>) -> BotBuilder {
        self.crypto_pay_token = Some(token.to_string());
        self.crypto_pay_api_base = api_base.map(str::to_string);
        self
    }

    pub fn parser_url(mut self, url: &str) -> BotBuilder {
        self.parser_url = Some(url.to_string());
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");

        // Basic authorization is in the form "Basic `secret`" where `secret`
        // is the base64 of the string "username:password".
        let secret = format!("{}:{}", self.username, self.password);
        let secret = format!("Basic {}", base64::prelude::BASE64_STANDARD.encode(secret));

        let mut auth = header::HeaderValue::try_from(secret)
            .map_err(|err| format!("invalid auth header value: {err}"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        let miniapp_url = match self.miniapp_url.as_deref() {
            Some(url) => {
                Some(Url::parse(url).map_err(|err| format!("invalid miniapp url: {err}"))?)
            }
            None => None,
        };

        let pay = match self.crypto_pay_token.as_deref() {
            Some(token) => Some(crypto_pay::CryptoPayClient::new(
                token,
                self.crypto_pay_api_base.as_deref(),
            )?),
            None => None,
        };

        let parser = self
            .parser_url
            .as_deref()
            .map(|url| parser::ParserClient::new(url.to_string()));

        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            server: self.server,
            client,
            pay,
            parser,
            miniapp_url,
        })
    }
}
