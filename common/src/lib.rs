//! Leafscan Common Library
//!
//! CLIとWeb(WASM)で共有される型・履歴ストア・検出フロー

pub mod types;
pub mod error;
pub mod store;
pub mod flow;
pub mod history;
pub mod sections;
pub mod prompts;
pub mod parser;
pub mod data_url;
pub mod gemini;

pub use types::{
    DetectionResult, Identification, Recommendation, RecommendationRequest, Verdict,
};
pub use error::{Error, Result};
pub use store::{History, HistoryStore, KeyValueBackend, MemoryBackend, MemoryHistory, HISTORY_KEY};
pub use flow::{DataUrlSource, DetectionFlow, FlowOutcome, FlowState, Identifier, ImageSource, Recommender};
pub use history::{confidence_percent, filter_history};
pub use sections::{split_recommendations, RecommendationSection};
pub use prompts::{build_identification_prompt, build_recommendation_prompt};
pub use parser::{extract_json, parse_identification_response, parse_recommendation_response};
pub use data_url::{build_data_url, extract_base64_from_data_url, extract_mime_type_from_data_url};
