pub mod config;
pub mod fetcher;
pub mod generator;
pub mod llm_adapter;
pub mod parser;
pub mod routes;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod store;
pub mod traits;
pub mod types;
pub mod utils;

pub use types::*;
pub use config::Config;
pub use fetcher::NewsApiFetcher;
pub use generator::PollGenerator;
pub use llm_adapter::GeminiAdapter;
pub use parser::{parse_poll_text, ParseError, ParsedPoll};
pub use scheduler::{PollScheduler, SchedulerHandle};
pub use service::PollService;
pub use state::{AppState, NextPollTime};
pub use store::{MemoryPollStore, PgPollStore};
pub use traits::{NewsSource, PollStore, TextGenerator};
