//! HTTP backend over the REST API.
//!
//! | Call            | Route                                      |
//! |-----------------|--------------------------------------------|
//! | catalog         | `GET  /api/catalog?kind={kind}`            |
//! | item history    | `GET  /api/items/{id}/history?kind={kind}` |
//! | account balance | `GET  /api/accounts/{id}/balance`          |
//! | prior invoice   | `GET  /api/invoices/{id}`                  |
//! | submit          | `POST /api/invoices/{kind}`                |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use tradedesk_core::catalog::{RawCatalog, RawItemHistory, RawPriorInvoice};
use tradedesk_core::coerce::lenient;
use tradedesk_core::{
    Catalog, ItemHistory, ItemId, Money, PriorInvoice, SubmitPayload, SubmitReceipt,
    TransactionKind,
};

use crate::backend::{ApiResponse, Backend};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Header carrying the save attempt's key so a retried POST is stored once.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Deserialize)]
struct RawBalance {
    #[serde(default, deserialize_with = "lenient::decimal")]
    balance: Decimal,
}

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackend {
    /// Creates a backend from validated configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.server.base_url)?,
            token: config.server.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds `{base}/api/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig("base URL cannot hold a path".into()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(%url, "GET");
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response and unwrap the envelope.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(text);
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(message)),
                StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::Rejected(message))
                }
                _ => {
                    error!(%status, %message, "Backend error");
                    Err(ClientError::Internal(message))
                }
            };
        }

        let body = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        envelope.data.ok_or_else(|| {
            ClientError::InvalidResponse(
                envelope
                    .message
                    .unwrap_or_else(|| "response has no data".to_string()),
            )
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn catalog(&self, kind: TransactionKind) -> ClientResult<Catalog> {
        let mut url = self.url(&["catalog"])?;
        url.query_pairs_mut().append_pair("kind", kind.as_str());

        let raw: RawCatalog = self.get(url).await?;
        let catalog = Catalog::from(raw);
        debug!(
            %kind,
            items = catalog.items.len(),
            accounts = catalog.accounts.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    async fn item_history(
        &self,
        item_id: &ItemId,
        kind: TransactionKind,
    ) -> ClientResult<Option<ItemHistory>> {
        let mut url = self.url(&["items", item_id.as_str(), "history"])?;
        url.query_pairs_mut().append_pair("kind", kind.as_str());

        match self.get::<RawItemHistory>(url).await {
            Ok(raw) => {
                let mut history = ItemHistory::from(raw);
                if history.item_id.as_str().is_empty() {
                    history.item_id = item_id.clone();
                }
                Ok(Some(history))
            }
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn account_balance(&self, account_id: &str) -> ClientResult<Money> {
        let url = self.url(&["accounts", account_id, "balance"])?;
        let raw: RawBalance = self.get(url).await?;
        Ok(Money::new(raw.balance))
    }

    async fn invoice(&self, invoice_id: &str) -> ClientResult<PriorInvoice> {
        let url = self.url(&["invoices", invoice_id])?;
        let raw: RawPriorInvoice = self.get(url).await?;
        PriorInvoice::try_from(raw).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn submit(
        &self,
        payload: &SubmitPayload,
        idempotency_key: Uuid,
    ) -> ClientResult<SubmitReceipt> {
        let url = self.url(&["invoices", payload.kind.as_str()])?;
        debug!(%url, %idempotency_key, lines = payload.lines.len(), "POST");

        let request = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(payload);
        let response = self.authorize(request).send().await?;
        let receipt: SubmitReceipt = Self::handle_response(response).await?;

        info!(
            kind = %payload.kind,
            invoice_id = %receipt.invoice_id,
            invoice_number = %receipt.invoice_number,
            "Invoice stored"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tradedesk_core::form::{derive_view, FormState};
    use tradedesk_core::{build_payload, FormMode, SubmitDirective};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend(server: &MockServer) -> HttpBackend {
        let mut config = ClientConfig::new(server.uri());
        config.server.token = Some("t0ken".to_string());
        HttpBackend::new(&config).unwrap()
    }

    fn ok(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": data}))
    }

    #[tokio::test]
    async fn test_catalog_is_ingested_leniently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/catalog"))
            .and(query_param("kind", "sale"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ok(json!({
                "items": [{"id": 1, "title": "Tea", "packing": null, "retailPrice": "250"}],
                "accounts": [{"id": "C1", "creditLimit": 1000}],
                "nextInvoiceNumber": "S-7"
            })))
            .mount(&server)
            .await;

        let catalog = backend(&server).await.catalog(TransactionKind::Sale).await.unwrap();
        assert_eq!(catalog.items[0].packing, Decimal::ONE);
        assert_eq!(catalog.items[0].retail_price, Money::from_whole(250));
        assert_eq!(catalog.next_invoice_number, "S-7");
    }

    #[tokio::test]
    async fn test_missing_history_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items/A%2F1/history"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let history = backend(&server)
            .await
            .item_history(&ItemId::new("A/1"), TransactionKind::Purchase)
            .await
            .unwrap();
        assert!(history.is_none());
    }

    #[tokio::test]
    async fn test_history_fills_item_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items/B7/history"))
            .and(query_param("kind", "purchase"))
            .respond_with(ok(json!({"previousFull": 3, "previousTradePrice": "41.5"})))
            .mount(&server)
            .await;

        let history = backend(&server)
            .await
            .item_history(&ItemId::new("B7"), TransactionKind::Purchase)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(history.item_id, ItemId::new("B7"));
        assert_eq!(history.previous_trade_price, Money::from_cents(4150));
    }

    #[tokio::test]
    async fn test_balance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts/C1/balance"))
            .respond_with(ok(json!({"balance": -120.25})))
            .mount(&server)
            .await;

        let balance = backend(&server).await.account_balance("C1").await.unwrap();
        assert_eq!(balance, Money::from_cents(-12025));
    }

    fn purchase_payload() -> SubmitPayload {
        let catalog = Catalog {
            next_invoice_number: "P-1".to_string(),
            ..Catalog::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let form = FormState::new(TransactionKind::Purchase, FormMode::Create, date, &catalog);
        build_payload(&form, &derive_view(&form, &catalog), &SubmitDirective::default())
    }

    #[tokio::test]
    async fn test_submit_posts_payload_with_idempotency_key() {
        let server = MockServer::start().await;
        let key = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/api/invoices/purchase"))
            .and(header(IDEMPOTENCY_HEADER, key.to_string().as_str()))
            .and(body_partial_json(json!({"kind": "purchase", "invoiceNumber": "P-1"})))
            .respond_with(ok(json!({"invoiceId": 501, "invoiceNumber": "P-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = backend(&server)
            .await
            .submit(&purchase_payload(), key)
            .await
            .unwrap();
        assert_eq!(receipt.invoice_id, "501");
    }

    #[tokio::test]
    async fn test_submit_retry_resends_the_same_key() {
        let server = MockServer::start().await;
        let key = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/api/invoices/purchase"))
            .and(header(IDEMPOTENCY_HEADER, key.to_string().as_str()))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/invoices/purchase"))
            .and(header(IDEMPOTENCY_HEADER, key.to_string().as_str()))
            .respond_with(ok(json!({"invoiceId": 502, "invoiceNumber": "P-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let http = backend(&server).await;
        let payload = purchase_payload();
        let first = http.submit(&payload, key).await.unwrap_err();
        assert!(first.is_transient());

        let receipt = http.submit(&payload, key).await.unwrap();
        assert_eq!(receipt.invoice_id, "502");
    }

    #[tokio::test]
    async fn test_error_statuses_map_to_variants() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/invoices/dup"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"success": false, "message": "already returned"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/invoices/auth"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/invoices/boom"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let http = backend(&server).await;
        match http.invoice("dup").await {
            Err(ClientError::Rejected(message)) => assert_eq!(message, "already returned"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(http.invoice("auth").await, Err(ClientError::Unauthorized)));
        assert!(matches!(http.invoice("boom").await, Err(ClientError::Internal(_))));
    }

    #[tokio::test]
    async fn test_envelope_without_data_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts/C1/balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let err = backend(&server).await.account_balance("C1").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_prior_invoice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/invoices/S-9"))
            .respond_with(ok(json!({
                "invoiceId": "S-9", "kind": "sale", "invoiceNumber": "INV-9",
                "date": "2024-03-01", "accountId": "C1",
                "lines": [{"itemId": "A", "pieces": 2, "rate": 50}]
            })))
            .mount(&server)
            .await;

        let invoice = backend(&server).await.invoice("S-9").await.unwrap();
        assert_eq!(invoice.kind, TransactionKind::Sale);
        assert_eq!(invoice.lines.len(), 1);
    }
}
