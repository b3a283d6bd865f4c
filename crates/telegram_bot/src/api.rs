use api_types::{
    expense::{ExpenseListResponse, ExpenseNew, ExpenseRecorded},
    friend::FriendsResponse,
    obligation::ObligationListResponse,
    settlement::{SettleResponse, SettlementsResponse},
    stats::CategoryTotalsResponse,
    user::{PairUser, UserView},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl ApiClient {
    pub(crate) fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn read_error(resp: reqwest::Response) -> ApiError {
        let status = resp.status();
        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        ApiError::Server { status, message }
    }

    async fn get_json<TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        telegram_user_id: u64,
        path: &str,
    ) -> Result<TResp, ApiError> {
        let resp = self
            .client
            .get(self.url(path))
            .header("telegram-user-id", telegram_user_id.to_string())
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::read_error(resp).await)
    }

    async fn post_json<TReq: serde::Serialize + ?Sized, TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        telegram_user_id: Option<u64>,
        path: &str,
        body: &TReq,
    ) -> Result<TResp, ApiError> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(id) = telegram_user_id {
            req = req.header("telegram-user-id", id.to_string());
        }

        let resp = req.send().await?;
        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::read_error(resp).await)
    }

    async fn post_json_unit<TReq: serde::Serialize + ?Sized>(
        &self,
        telegram_user_id: Option<u64>,
        path: &str,
        body: &TReq,
    ) -> Result<(), ApiError> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(id) = telegram_user_id {
            req = req.header("telegram-user-id", id.to_string());
        }

        let resp = req.send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(Self::read_error(resp).await)
    }

    pub(crate) async fn pair_user(
        &self,
        telegram_user_id: u64,
        code: &str,
    ) -> Result<(), ApiError> {
        self.post_json_unit(
            None,
            "/user/pair",
            &PairUser {
                code: code.to_string(),
                telegram_id: telegram_user_id.to_string(),
            },
        )
        .await
    }

    pub(crate) async fn me(&self, telegram_user_id: u64) -> Result<UserView, ApiError> {
        self.get_json(telegram_user_id, "/user/me").await
    }

    pub(crate) async fn settlements(
        &self,
        telegram_user_id: u64,
    ) -> Result<SettlementsResponse, ApiError> {
        self.get_json(telegram_user_id, "/settlements").await
    }

    pub(crate) async fn pending_obligations(
        &self,
        telegram_user_id: u64,
    ) -> Result<ObligationListResponse, ApiError> {
        self.get_json(telegram_user_id, "/obligations?status=pending")
            .await
    }

    pub(crate) async fn settle(
        &self,
        telegram_user_id: u64,
        obligation_id: Uuid,
    ) -> Result<SettleResponse, ApiError> {
        self.post_json(
            Some(telegram_user_id),
            &format!("/obligations/{obligation_id}/settle"),
            &serde_json::json!({}),
        )
        .await
    }

    pub(crate) async fn category_totals(
        &self,
        telegram_user_id: u64,
    ) -> Result<CategoryTotalsResponse, ApiError> {
        self.get_json(telegram_user_id, "/stats/categories").await
    }

    pub(crate) async fn friends(
        &self,
        telegram_user_id: u64,
    ) -> Result<FriendsResponse, ApiError> {
        self.get_json(telegram_user_id, "/friends").await
    }

    pub(crate) async fn record_expense(
        &self,
        telegram_user_id: u64,
        payload: &ExpenseNew,
    ) -> Result<ExpenseRecorded, ApiError> {
        self.post_json(Some(telegram_user_id), "/expenses", payload)
            .await
    }

    pub(crate) async fn settled_expenses(
        &self,
        telegram_user_id: u64,
        limit: u64,
        cursor: Option<&str>,
    ) -> Result<ExpenseListResponse, ApiError> {
        let mut path = format!("/expenses?limit={limit}");
        if let Some(cursor) = cursor {
            path.push_str("&cursor=");
            path.push_str(cursor);
        }
        self.get_json(telegram_user_id, &path).await
    }
}
