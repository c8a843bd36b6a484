//! Riot Games API client.
//!
//! All Riot API specifics are isolated in this module: the recognized
//! endpoint set and its routing, the shared rate-limit budget, the retry
//! policy, and schema-validated deserialization of responses. The client
//! holds its own configuration and budget; call sites share it behind an
//! `Arc` rather than through process-wide state.

pub mod budget;
pub mod retry;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::{LeagueList, MatchRecord, Summoner};
use budget::{RateLimitBudget, WindowLimit};
use retry::RetryPolicy;
use transport::{ApiTransport, HttpTransport, TransportError};

/// Errors surfaced by the Riot client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failures, timeouts, and HTTP 5xx after retry exhaustion.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 404. Not retried; a recoverable "no data" case.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Payload shape mismatch. Not retried; signals an API contract change.
    #[error("response failed schema validation: {0}")]
    InvalidResponseSchema(String),

    /// HTTP 429 on every permitted attempt.
    #[error("rate limit budget exhausted after {attempts} attempts")]
    RateLimitExceededPermanently { attempts: u32 },

    /// Request rejected before any network traffic or budget use.
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),

    /// Any other status the taxonomy has no arm for (401, 403, ...).
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },
}

/// The fixed set of recognized Riot API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// league-v4 challenger league for a queue. Requires `queue`.
    ChallengerLeague,
    /// summoner-v4 by encrypted summoner ID. Requires `summonerId`.
    SummonerById,
    /// match-v5 match-ID listing for a PUUID. Requires `puuid`; `start`
    /// and `count` page through it.
    MatchIdsByPuuid,
    /// match-v5 match detail. Requires `matchId`.
    MatchById,
}

impl Endpoint {
    /// Parameter names that must be present and non-empty before a call
    /// proceeds.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Endpoint::ChallengerLeague => &["queue"],
            Endpoint::SummonerById => &["summonerId"],
            Endpoint::MatchIdsByPuuid => &["puuid"],
            Endpoint::MatchById => &["matchId"],
        }
    }

    /// Match-v5 endpoints are served from the regional routing host
    /// (`americas`); the rest from the platform host (`na1`).
    pub fn uses_regional_routing(&self) -> bool {
        matches!(self, Endpoint::MatchIdsByPuuid | Endpoint::MatchById)
    }

    /// Path on the API host, with path parameters substituted. Only valid
    /// after parameter validation.
    fn path(&self, params: &[(&str, String)]) -> String {
        match self {
            Endpoint::ChallengerLeague => format!(
                "/lol/league/v4/challengerleagues/by-queue/{}",
                param(params, "queue")
            ),
            Endpoint::SummonerById => {
                format!("/lol/summoner/v4/summoners/{}", param(params, "summonerId"))
            }
            Endpoint::MatchIdsByPuuid => format!(
                "/lol/match/v5/matches/by-puuid/{}/ids",
                param(params, "puuid")
            ),
            Endpoint::MatchById => {
                format!("/lol/match/v5/matches/{}", param(params, "matchId"))
            }
        }
    }

    /// Parameters that travel in the query string rather than the path.
    fn query(&self, params: &[(&str, String)]) -> Vec<(String, String)> {
        let query_names: &[&str] = match self {
            Endpoint::MatchIdsByPuuid => &["start", "count"],
            _ => &[],
        };
        params
            .iter()
            .filter(|(name, _)| query_names.contains(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

fn param<'a>(params: &'a [(&str, String)], name: &str) -> &'a str {
    params
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

fn validate_params(endpoint: Endpoint, params: &[(&str, String)]) -> Result<(), FetchError> {
    for required in endpoint.required_params() {
        let present = params
            .iter()
            .any(|(name, value)| name == required && !value.is_empty());
        if !present {
            return Err(FetchError::InvalidParams(format!(
                "{endpoint:?} requires `{required}`"
            )));
        }
    }
    Ok(())
}

/// Client behavior knobs. Credentials stay in the transport.
#[derive(Debug, Clone)]
pub struct RiotClientConfig {
    /// Platform host, e.g. `na1`.
    pub region: String,

    /// Regional routing host for match-v5, e.g. `americas`.
    pub routing: String,

    /// Backoff schedule for transient failures.
    pub retry: RetryPolicy,

    /// Per-request network timeout.
    pub request_timeout: Duration,

    /// How long a caller may wait for a rate-limit slot before the fetch
    /// fails instead of hanging.
    pub budget_wait_timeout: Duration,
}

impl Default for RiotClientConfig {
    fn default() -> Self {
        Self {
            region: "na1".to_string(),
            routing: "americas".to_string(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
            budget_wait_timeout: Duration::from_secs(120),
        }
    }
}

/// Rate-limited Riot API client. One instance holds the budget shared by
/// every concurrent requester.
pub struct RiotClient {
    transport: Arc<dyn ApiTransport>,
    budget: RateLimitBudget,
    config: RiotClientConfig,
}

impl RiotClient {
    pub fn new(
        api_key: String,
        limits: Vec<WindowLimit>,
        config: RiotClientConfig,
    ) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(api_key, config.request_timeout)
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self::with_transport(Arc::new(transport), limits, config))
    }

    /// Build the client on a custom transport. This is the seam tests use
    /// to script responses.
    pub fn with_transport(
        transport: Arc<dyn ApiTransport>,
        limits: Vec<WindowLimit>,
        config: RiotClientConfig,
    ) -> Self {
        Self {
            transport,
            budget: RateLimitBudget::new(limits),
            config,
        }
    }

    fn url_for(&self, endpoint: Endpoint, params: &[(&str, String)]) -> String {
        let host = if endpoint.uses_regional_routing() {
            &self.config.routing
        } else {
            &self.config.region
        };
        format!("https://{}.api.riotgames.com{}", host, endpoint.path(params))
    }

    /// Issue a GET against a recognized endpoint.
    ///
    /// Parameters are validated first, so a malformed request consumes no
    /// rate-limit slot. Each attempt (including retries) acquires one slot
    /// from the shared budget. Transient failures and 5xx retry with
    /// exponential backoff; 429 waits for the server's `Retry-After` (or the
    /// computed backoff) and retries; 404 and schema failures surface
    /// immediately.
    pub async fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, FetchError> {
        validate_params(endpoint, params)?;
        let url = self.url_for(endpoint, params);
        let query = endpoint.query(params);

        let mut attempt: u32 = 0;
        loop {
            let granted = self.budget.acquire_timeout(self.config.budget_wait_timeout).await;
            if !granted {
                return Err(FetchError::Network(
                    "timed out waiting for a rate limit slot".to_string(),
                ));
            }

            match self.transport.get(&url, &query).await {
                Ok(response) if response.status == 200 => {
                    debug!(?endpoint, attempt, "request succeeded");
                    return serde_json::from_str(&response.body)
                        .map_err(|e| FetchError::InvalidResponseSchema(e.to_string()));
                }
                Ok(response) if response.status == 404 => {
                    debug!(?endpoint, "resource not found");
                    return Err(FetchError::NotFound(format!("{endpoint:?}")));
                }
                Ok(response) if response.status == 429 => {
                    if !self.config.retry.attempts_left(attempt) {
                        return Err(FetchError::RateLimitExceededPermanently {
                            attempts: attempt + 1,
                        });
                    }
                    let wait = response
                        .retry_after
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| self.config.retry.delay_for(attempt));
                    warn!(
                        ?endpoint,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "rate limited by server, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Ok(response) if response.status >= 500 => {
                    if !self.config.retry.attempts_left(attempt) {
                        return Err(FetchError::Network(format!(
                            "HTTP {} after {} attempts",
                            response.status,
                            attempt + 1
                        )));
                    }
                    let wait = self.config.retry.delay_for(attempt);
                    warn!(
                        ?endpoint,
                        attempt,
                        status = response.status,
                        wait_ms = wait.as_millis() as u64,
                        "server error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Ok(response) => {
                    warn!(?endpoint, status = response.status, "unexpected status");
                    return Err(FetchError::Status {
                        status: response.status,
                    });
                }
                Err(err) => {
                    let detail = match &err {
                        TransportError::Timeout => "request timed out".to_string(),
                        TransportError::Connect(msg) => msg.clone(),
                    };
                    if !self.config.retry.attempts_left(attempt) {
                        return Err(FetchError::Network(format!(
                            "{detail} after {} attempts",
                            attempt + 1
                        )));
                    }
                    let wait = self.config.retry.delay_for(attempt);
                    warn!(
                        ?endpoint,
                        attempt,
                        error = %detail,
                        wait_ms = wait.as_millis() as u64,
                        "transient network failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }

            attempt += 1;
        }
    }

    async fn fetch_typed<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let value = self.fetch(endpoint, params).await?;
        serde_json::from_value(value).map_err(|e| FetchError::InvalidResponseSchema(e.to_string()))
    }

    /// Challenger league listing for a ranked queue.
    pub async fn challenger_league(&self, queue: &str) -> Result<LeagueList, FetchError> {
        self.fetch_typed(
            Endpoint::ChallengerLeague,
            &[("queue", queue.to_string())],
        )
        .await
    }

    /// Summoner record by encrypted summoner ID.
    pub async fn summoner(&self, summoner_id: &str) -> Result<Summoner, FetchError> {
        self.fetch_typed(
            Endpoint::SummonerById,
            &[("summonerId", summoner_id.to_string())],
        )
        .await
    }

    /// One page of match IDs for a PUUID.
    pub async fn match_ids(
        &self,
        puuid: &str,
        start: u32,
        count: u32,
    ) -> Result<Vec<String>, FetchError> {
        self.fetch_typed(
            Endpoint::MatchIdsByPuuid,
            &[
                ("puuid", puuid.to_string()),
                ("start", start.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await
    }

    /// Match IDs for a PUUID, paged until `total` are collected or the API
    /// returns a short page.
    pub async fn match_ids_for(&self, puuid: &str, total: u32) -> Result<Vec<String>, FetchError> {
        // match-v5 caps `count` at 100 per call.
        const PAGE: u32 = 100;

        let mut ids: Vec<String> = Vec::new();
        let mut start = 0;
        while (ids.len() as u32) < total {
            let count = PAGE.min(total - ids.len() as u32);
            let page = self.match_ids(puuid, start, count).await?;
            let got = page.len() as u32;
            ids.extend(page);
            if got < count {
                break;
            }
            start += got;
        }
        Ok(ids)
    }

    /// Full match record by match ID.
    pub async fn match_by_id(&self, match_id: &str) -> Result<MatchRecord, FetchError> {
        self.fetch_typed(Endpoint::MatchById, &[("matchId", match_id.to_string())])
            .await
    }

    /// Fetch several summoners concurrently. All requests draw on the same
    /// budget; the first error wins and aborts the remaining lookups.
    pub async fn summoners_by_ids(
        self: &Arc<Self>,
        summoner_ids: &[String],
    ) -> Result<Vec<Summoner>, FetchError> {
        let mut tasks = JoinSet::new();
        for id in summoner_ids {
            let client = Arc::clone(self);
            let id = id.clone();
            tasks.spawn(async move { client.summoner(&id).await });
        }

        let mut summoners = Vec::with_capacity(summoner_ids.len());
        while let Some(joined) = tasks.join_next().await {
            let summoner =
                joined.map_err(|e| FetchError::Network(format!("task join failed: {e}")))??;
            summoners.push(summoner);
        }
        Ok(summoners)
    }

    /// Rate-limit slots currently consumed, per window.
    pub async fn budget_occupancy(&self) -> Vec<usize> {
        self.budget.occupancy().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::transport::mock::MockTransport;
    use super::transport::ApiResponse;
    use super::*;

    fn ample_budget() -> Vec<WindowLimit> {
        vec![WindowLimit::new(1000, 1)]
    }

    fn client(transport: MockTransport) -> RiotClient {
        RiotClient::with_transport(Arc::new(transport), ample_budget(), RiotClientConfig::default())
    }

    fn client_with(transport: Arc<MockTransport>, config: RiotClientConfig) -> RiotClient {
        RiotClient::with_transport(transport, ample_budget(), config)
    }

    #[tokio::test]
    async fn test_missing_param_fails_fast_without_network_or_budget() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let err = client.fetch(Endpoint::MatchById, &[]).await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidParams(_)));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(client.budget_occupancy().await, vec![0]);
    }

    #[tokio::test]
    async fn test_empty_param_value_rejected() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let err = client
            .fetch(Endpoint::SummonerById, &[("summonerId", String::new())])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::InvalidParams(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_fetch_returns_payload() {
        let transport =
            MockTransport::new().respond_with(vec![ApiResponse::ok(r#"{"tier": "CHALLENGER"}"#)]);
        let client = client(transport);

        let value = client
            .fetch(
                Endpoint::ChallengerLeague,
                &[("queue", "RANKED_SOLO_5x5".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(value["tier"], "CHALLENGER");
        assert_eq!(client.budget_occupancy().await, vec![1]);
    }

    #[tokio::test]
    async fn test_routing_split_between_hosts() {
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![ApiResponse::ok("[]")]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap();
        client
            .fetch(
                Endpoint::ChallengerLeague,
                &[("queue", "RANKED_SOLO_5x5".to_string())],
            )
            .await
            .ok();

        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].url.starts_with("https://americas.api.riotgames.com"));
        assert!(calls[1].url.starts_with("https://na1.api.riotgames.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_waits_for_retry_after_then_succeeds() {
        let rate_limited = ApiResponse {
            status: 429,
            retry_after: Some(2),
            body: String::new(),
        };
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![rate_limited, ApiResponse::ok("[]")]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let value = client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!([]));
        let instants = transport.call_instants();
        assert_eq!(instants.len(), 2);
        assert!(instants[1].duration_since(instants[0]) >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_without_retry_after_uses_backoff() {
        let transport = Arc::new(
            MockTransport::new()
                .respond_with(vec![ApiResponse::status(429), ApiResponse::ok("[]")]),
        );
        let mut config = RiotClientConfig::default();
        config.retry.jitter = 0.0;
        let client = client_with(Arc::clone(&transport), config);

        client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap();

        let instants = transport.call_instants();
        assert_eq!(
            instants[1].duration_since(instants[0]),
            Duration::from_millis(500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_429_exhausts_retry_budget() {
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![ApiResponse::status(429)]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let err = client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::RateLimitExceededPermanently { attempts: 5 }
        ));
        assert_eq!(transport.call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_500_retries_with_increasing_backoff() {
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![ApiResponse::status(500)]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let err = client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network(_)));

        let instants = transport.call_instants();
        assert_eq!(instants.len(), 5);
        let gaps: Vec<Duration> = instants
            .windows(2)
            .map(|pair| pair[1].duration_since(pair[0]))
            .collect();
        for pair in gaps.windows(2) {
            assert!(pair[1] > pair[0], "backoff gaps must strictly increase: {gaps:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failures_retry_then_succeed() {
        let transport = Arc::new(
            MockTransport::new()
                .fail_connects(2)
                .respond_with(vec![ApiResponse::ok("[]")]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let value = client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!([]));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_404_not_retried() {
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![ApiResponse::status(404)]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let err = client
            .fetch(Endpoint::MatchById, &[("matchId", "NA1_404".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_schema_mismatch_not_retried() {
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![ApiResponse::ok(r#"{"not": "a list"}"#)]),
        );
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let err = client.match_ids("p1", 0, 5).await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidResponseSchema(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_status_surfaces() {
        let transport =
            MockTransport::new().respond_with(vec![ApiResponse::status(403)]);
        let client = client(transport);

        let err = client
            .fetch(Endpoint::MatchById, &[("matchId", "NA1_1".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 403 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_wait_timeout_maps_to_network_error() {
        let transport = Arc::new(
            MockTransport::new().respond_with(vec![ApiResponse::ok("[]")]),
        );
        let config = RiotClientConfig {
            budget_wait_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let client = RiotClient::with_transport(
            Arc::clone(&transport) as Arc<dyn ApiTransport>,
            vec![WindowLimit::new(1, 3600)],
            config,
        );

        client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p1".to_string())])
            .await
            .unwrap();
        let err = client
            .fetch(Endpoint::MatchIdsByPuuid, &[("puuid", "p2".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_match_ids_pagination_stops_on_short_page() {
        let page1: Vec<String> = (0..100).map(|i| format!("NA1_{i}")).collect();
        let page2: Vec<String> = (100..150).map(|i| format!("NA1_{i}")).collect();
        let transport = Arc::new(MockTransport::new().respond_with(vec![
            ApiResponse::ok(serde_json::to_string(&page1).unwrap()),
            ApiResponse::ok(serde_json::to_string(&page2).unwrap()),
        ]));
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let ids = client.match_ids_for("p1", 500).await.unwrap();

        assert_eq!(ids.len(), 150);
        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].query.contains(&("start".to_string(), "0".to_string())));
        assert!(calls[1].query.contains(&("start".to_string(), "100".to_string())));
    }

    #[tokio::test]
    async fn test_match_ids_pagination_respects_total() {
        let page: Vec<String> = (0..5).map(|i| format!("NA1_{i}")).collect();
        let transport = Arc::new(MockTransport::new().respond_with(vec![ApiResponse::ok(
            serde_json::to_string(&page).unwrap(),
        )]));
        let client = client_with(Arc::clone(&transport), RiotClientConfig::default());

        let ids = client.match_ids_for("p1", 5).await.unwrap();

        assert_eq!(ids.len(), 5);
        assert_eq!(transport.call_count(), 1);
        assert!(transport.calls.lock().unwrap()[0]
            .query
            .contains(&("count".to_string(), "5".to_string())));
    }

    #[tokio::test]
    async fn test_summoners_by_ids_fan_out() {
        let transport = MockTransport::new().route(
            "/lol/summoner/v4/summoners/",
            ApiResponse::ok(
                r#"{"id": "s1", "accountId": "a1", "puuid": "p1", "summonerLevel": 100}"#,
            ),
        );
        let client = Arc::new(client(transport));

        let ids = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];
        let summoners = client.summoners_by_ids(&ids).await.unwrap();

        assert_eq!(summoners.len(), 3);
    }
}
