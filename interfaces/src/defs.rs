use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publisher of a headline as reported by the provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlineSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One article from a top-headlines listing.
///
/// Providers are free to omit any field, including the title, so every
/// field is optional and consumers choose their own fallbacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    #[serde(default)]
    pub source: Option<HeadlineSource>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Headline {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Filter for a top-headlines request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsQuery {
    pub country: String,
    pub category: Option<String>,
    pub language: Option<String>,
}

impl NewsQuery {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            category: None,
            language: None,
        }
    }
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self::country("us")
    }
}

/// Response body of the headline provider.
///
/// An error response carries `status = "error"` plus `code`/`message` and no
/// articles; an empty listing is a valid, successful response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Option<Vec<Headline>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewsApiEnvelope {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    pub fn into_articles(self) -> Vec<Headline> {
        self.articles.unwrap_or_default()
    }
}

// Object style note:
// These are wire and contract types only. Behaviour lives in the service
// crate behind its collaborator traits, so a provider can be swapped
// without touching anything that consumes a `Headline`.
