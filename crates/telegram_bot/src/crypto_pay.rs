//! Client for the Crypto Pay HTTP API (CryptoBot).
//!
//! Used by the settle flow: invoices collect a debt in USDT, transfers
//! forward the collected amount to the counterparty. Both are external
//! collaborator calls; a failure here never affects the ledger.

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://pay.crypt.bot/api";

/// Asset used for settlements.
pub(crate) const SETTLEMENT_ASSET: &str = "USDT";

#[derive(Clone, Debug)]
pub(crate) struct CryptoPayClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("crypto pay api error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Invoice {
    pub invoice_id: i64,
    pub pay_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Transfer {
    pub transfer_id: i64,
}

#[derive(Serialize)]
struct CreateInvoice<'a> {
    asset: &'a str,
    amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a str>,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    user_id: u64,
    asset: &'a str,
    amount: String,
    spend_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

/// Minor units as the decimal string the gateway expects ("25.50").
fn major_string(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

impl CryptoPayClient {
    pub(crate) fn new(token: &str, api_base: Option<&str>) -> Result<Self, String> {
        let mut value = header::HeaderValue::try_from(token)
            .map_err(|err| format!("invalid crypto pay token: {err}"))?;
        value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("Crypto-Pay-API-Token", value);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| format!("failed to build crypto pay client: {err}"))?;

        Ok(Self {
            client,
            base_url: api_base.unwrap_or(DEFAULT_API_BASE).to_string(),
        })
    }

    async fn call<TReq: Serialize, TResp: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &TReq,
    ) -> Result<TResp, PayError> {
        let url = format!("{}/{method}", self.base_url.trim_end_matches('/'));
        let resp = self.client.post(url).json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PayError::Api(format!("{method} failed with {status}")));
        }

        let envelope = resp.json::<Envelope<TResp>>().await?;
        if !envelope.ok {
            return Err(PayError::Api(format!("{method} returned ok=false")));
        }
        envelope
            .result
            .ok_or_else(|| PayError::Api(format!("{method} returned no result")))
    }

    /// Creates a USDT invoice and returns it (with the `pay_url` to share).
    pub(crate) async fn create_invoice(
        &self,
        amount_minor: i64,
        description: Option<&str>,
        payload: Option<&str>,
    ) -> Result<Invoice, PayError> {
        self.call(
            "createInvoice",
            &CreateInvoice {
                asset: SETTLEMENT_ASSET,
                amount: major_string(amount_minor),
                description,
                payload,
            },
        )
        .await
    }

    /// Sends USDT to a telegram user.
    ///
    /// `spend_id` makes the transfer idempotent on the gateway side; callers
    /// pass the obligation id so a retried settle cannot pay twice.
    pub(crate) async fn transfer(
        &self,
        telegram_user_id: u64,
        amount_minor: i64,
        spend_id: &str,
        comment: Option<&str>,
    ) -> Result<Transfer, PayError> {
        self.call(
            "transfer",
            &TransferRequest {
                user_id: telegram_user_id,
                asset: SETTLEMENT_ASSET,
                amount: major_string(amount_minor),
                spend_id,
                comment,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_string_renders_two_decimals() {
        assert_eq!(major_string(0), "0.00");
        assert_eq!(major_string(5), "0.05");
        assert_eq!(major_string(2550), "25.50");
        assert_eq!(major_string(-130), "-1.30");
    }
}
