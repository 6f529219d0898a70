use crate::traits::NewsSource;
use crate::types::{Headline, NewsApiEnvelope, NewsQuery, PollError, Result, UpstreamConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Top-headlines client for a NewsAPI-compatible provider.
pub struct NewsApiFetcher {
    client: Client,
    endpoint: Url,
    api_key: String,
    default_country: String,
}

impl NewsApiFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let endpoint = Url::parse(&config.news_api_url)
            .map_err(|e| PollError::InvalidArgument(format!("news api url: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.news_api_key.clone(),
            default_country: config.news_country.clone(),
        })
    }

    fn request_url(&self, query: &NewsQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("country", &query.country);
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            if let Some(language) = &query.language {
                pairs.append_pair("language", language);
            }
        }
        url
    }
}

#[async_trait]
impl NewsSource for NewsApiFetcher {
    fn source_name(&self) -> String {
        self.endpoint
            .host_str()
            .unwrap_or("news-api")
            .to_string()
    }

    async fn top_headlines(&self, query: &NewsQuery) -> Result<Vec<Headline>> {
        let start_time = Instant::now();
        let url = self.request_url(query);
        debug!("Fetching headlines: {}", url);

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let envelope: NewsApiEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(PollError::UpstreamUnavailable(format!(
                    "malformed headline response: {}",
                    e
                )));
            }
            Err(_) => NewsApiEnvelope::default(),
        };

        if !status.is_success() || envelope.is_error() {
            let message = envelope
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
            warn!("Headline provider answered HTTP {}: {}", status, message);
            return Err(PollError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let articles = envelope.into_articles();
        info!(
            "Fetched {} headlines for {} in {}ms",
            articles.len(),
            query.country,
            start_time.elapsed().as_millis()
        );
        Ok(articles)
    }

    async fn latest(&self) -> Result<Vec<Headline>> {
        self.top_headlines(&NewsQuery::country(self.default_country.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_carries_filters() {
        let fetcher = NewsApiFetcher::new(&UpstreamConfig::default()).unwrap();
        let query = NewsQuery {
            country: "gb".to_string(),
            category: Some("science".to_string()),
            language: None,
        };
        let url = fetcher.request_url(&query);
        assert_eq!(url.host_str(), Some("newsapi.org"));
        assert_eq!(url.query(), Some("country=gb&category=science"));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = UpstreamConfig {
            news_api_url: "not a url".to_string(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(
            NewsApiFetcher::new(&config),
            Err(PollError::InvalidArgument(_))
        ));
    }
}
