pub mod defs;

pub use defs::{Headline, HeadlineSource, NewsApiEnvelope, NewsQuery};
