use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::context::CallContext;
use crate::core::exchange::{ExchangeError, ExchangeRequest, Exchanger};

const PRICE_CONVERSION_PATH: &str = "/v2/tools/price-conversion";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(5);

// CmcClient implementation for Exchanger
pub struct CmcClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl CmcClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("failed to create api client: invalid base URL {base_url}"))?;
        let endpoint = base
            .join(PRICE_CONVERSION_PATH)
            .context("failed to parse path")?;

        let client = reqwest::Client::builder()
            .user_agent("fxcli/0.1")
            .timeout(TRANSPORT_TIMEOUT)
            .build()
            .context("failed to create http client")?;

        Ok(CmcClient {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    fn request_url(&self, request: &ExchangeRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("amount", &format!("{:.2}", request.amount))
            .append_pair("symbol", &request.from)
            .append_pair("convert", &request.to);
        url
    }
}

// `null` at any level reads the same as an absent key.
#[derive(Debug, Default, Deserialize)]
struct CmcResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    data: HashMap<String, Option<CmcData>>,
}

#[derive(Debug, Default, Deserialize)]
struct CmcData {
    #[serde(default, deserialize_with = "null_as_default")]
    quote: HashMap<String, Option<CmcQuote>>,
}

#[derive(Debug, Default, Deserialize)]
struct CmcQuote {
    price: Option<f64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait]
impl Exchanger for CmcClient {
    #[instrument(
        name = "CmcExchange",
        skip(self, ctx),
        fields(from = %request.from, to = %request.to)
    )]
    async fn exchange(
        &self,
        ctx: &CallContext,
        request: &ExchangeRequest,
    ) -> Result<f64, ExchangeError> {
        let url = self.request_url(request);
        debug!("Requesting price conversion from {}", url);

        let (status, body) = ctx
            .run(async {
                let response = self
                    .client
                    .get(url)
                    .header(ACCEPT, "application/json")
                    .header(API_KEY_HEADER, &self.api_key)
                    .send()
                    .await
                    .map_err(ExchangeError::Transport)?;

                let status = response.status();
                let body = response.bytes().await.map_err(ExchangeError::Read)?;
                Ok::<_, ExchangeError>((status, body))
            })
            .await??;

        debug!(%status, bytes = body.len(), "Received CMC response");

        if status != StatusCode::OK {
            return Err(ExchangeError::BadStatus(status));
        }

        let res: CmcResponse =
            serde_json::from_slice::<Option<CmcResponse>>(&body)?.unwrap_or_default();

        let data = res
            .data
            .get(&request.from)
            .ok_or_else(|| ExchangeError::MissingData(request.from.clone()))?;

        let quote = data
            .as_ref()
            .and_then(|data| data.quote.get(&request.to))
            .ok_or_else(|| ExchangeError::MissingQuote(request.to.clone()))?;

        Ok(quote
            .as_ref()
            .and_then(|quote| quote.price)
            .unwrap_or_default())
    }
}
