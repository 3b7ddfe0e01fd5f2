use crate::config::{PipelineConfig, SportsDataIOConfig};
use crate::error::{PipelineError, Result};
use crate::models::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::info;

/// Header carrying the SportsDataIO subscription key
pub const SUBSCRIPTION_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Raw rows for one resolved season/week
#[derive(Debug, Clone)]
pub struct WeekStats {
    pub season: i32,
    pub week: i32,
    pub rows: Vec<PlayerGameStats>,
}

/// Source of raw weekly player stats
#[async_trait]
pub trait StatSource: Send + Sync {
    /// Label reported as the summary's data source
    fn label(&self) -> &str;

    /// Fail with a configuration error if the source cannot be called at all
    fn ensure_configured(&self) -> Result<()>;

    /// Current NFL week according to the provider
    async fn fetch_current_week(&self) -> Result<i32>;

    /// Per-player rows for a season/week, in provider order
    async fn fetch_player_game_stats(
        &self,
        season: i32,
        week: i32,
    ) -> Result<Vec<PlayerGameStats>>;

    /// Resolve the week (asking the provider when `week` is `None`) and fetch it
    async fn fetch_week(&self, season: i32, week: Option<i32>) -> Result<WeekStats> {
        self.ensure_configured()?;

        let week = match week {
            Some(week) => week,
            None => self.fetch_current_week().await?,
        };

        let rows = self.fetch_player_game_stats(season, week).await?;
        Ok(WeekStats { season, week, rows })
    }
}

/// SportsDataIO NFL API client
pub struct SportsDataIOFetcher {
    config: SportsDataIOConfig,
    client: Client,
}

impl SportsDataIOFetcher {
    /// Create a new fetcher instance
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PipelineError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: config.sportsdataio.clone(),
            client,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.config.api_key.as_deref().ok_or_else(|| {
            PipelineError::configuration(format!(
                "{} environment variable required",
                crate::config::API_KEY_ENV
            ))
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let api_key = self.api_key()?;
        let url = self.url(path);

        info!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header(SUBSCRIPTION_HEADER, api_key)
            .send()
            .await
            .map_err(|e| PipelineError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::UpstreamStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::transport(&url, e))?;

        serde_json::from_str(&body).map_err(|e| PipelineError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl StatSource for SportsDataIOFetcher {
    fn label(&self) -> &str {
        SPORTSDATA_SOURCE
    }

    fn ensure_configured(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn fetch_current_week(&self) -> Result<i32> {
        let current: CurrentWeek = self.get_json("scores/json/CurrentWeek").await?;
        info!("Provider reports current week {}", current.week());
        Ok(current.week())
    }

    async fn fetch_player_game_stats(
        &self,
        season: i32,
        week: i32,
    ) -> Result<Vec<PlayerGameStats>> {
        let rows: Vec<PlayerGameStats> = self
            .get_json(&format!("stats/json/PlayerGameStatsByWeek/{season}/{week}"))
            .await?;

        info!(
            "Successfully fetched {} player game stats for season {} week {}",
            rows.len(),
            season,
            week
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn fetcher_for(server: &MockServer, api_key: Option<&str>) -> SportsDataIOFetcher {
        let mut config = PipelineConfig::default().with_base_url(server.uri());
        config.sportsdataio.api_key = api_key.map(str::to_string);
        SportsDataIOFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_week_stats_sends_key_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stats/json/PlayerGameStatsByWeek/2024/3"))
            .and(header(SUBSCRIPTION_HEADER, "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"PlayerID": 1, "Name": "Josh Allen", "Team": "BUF", "Position": "QB",
                 "PassingYards": 300.0},
                {"PlayerID": 2, "Name": "James Cook", "Team": "BUF", "Position": "RB",
                 "RushingYards": 88.0}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, Some("test-key"));
        let week = fetcher.fetch_week(2024, Some(3)).await.unwrap();

        assert_eq!(week.week, 3);
        assert_eq!(week.season, 2024);
        assert_eq!(week.rows.len(), 2);
        assert_eq!(week.rows[1].name(), Some("James Cook"));
    }

    #[tokio::test]
    async fn test_one_odd_row_keeps_the_rest_of_the_week() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stats/json/PlayerGameStatsByWeek/2024/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"Name": "Josh Allen", "Team": "BUF", "Position": "QB", "Week": 3,
                 "PassingYards": 300.0},
                {"Name": "Odd Row", "Team": "KC", "Position": "WR", "Week": "3", "PlayerID": "x"},
                {"Name": "James Cook", "Team": "BUF", "Position": "RB", "Week": 3,
                 "RushingYards": 88.0}
            ])))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, Some("test-key"));
        let week = fetcher.fetch_week(2024, Some(3)).await.unwrap();

        assert_eq!(week.rows.len(), 3);
        assert_eq!(week.rows[0].name(), Some("Josh Allen"));
        assert_eq!(week.rows[1].name(), Some("Odd Row"));
        assert_eq!(week.rows[1].player_id(), None);
        assert_eq!(week.rows[2].name(), Some("James Cook"));
    }

    #[tokio::test]
    async fn test_unspecified_week_uses_current_week() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/scores/json/CurrentWeek"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(11)))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/stats/json/PlayerGameStatsByWeek/2024/11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, Some("test-key"));
        let week = fetcher.fetch_week(2024, None).await.unwrap();

        assert_eq!(week.week, 11);
        assert!(week.rows.is_empty());
    }

    #[tokio::test]
    async fn test_current_week_object_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/scores/json/CurrentWeek"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Week": 4})))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, Some("test-key"));
        assert_eq!(fetcher.fetch_current_week().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, None);
        let err = fetcher.fetch_week(2024, None).await.unwrap_err();

        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, Some("bad-key"));
        let err = fetcher.fetch_player_game_stats(2024, 1).await.unwrap_err();

        match &err {
            PipelineError::UpstreamStatus { status, .. } => assert_eq!(*status, 401),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let config = PipelineConfig::default()
            .with_api_key("k")
            .with_base_url("http://127.0.0.1:1");
        let fetcher = SportsDataIOFetcher::new(&config).unwrap();

        let err = fetcher.fetch_player_game_stats(2024, 1).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server, Some("k"));
        let err = fetcher.fetch_player_game_stats(2024, 1).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
