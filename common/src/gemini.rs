//! Gemini API のリクエスト/レスポンス型
//!
//! 通信はCLI（reqwest）とWeb（fetch）で別実装。ここでは本文の組み立てと
//! レスポンス本文の取り出しだけを共通化する。

use crate::data_url::{extract_base64_from_data_url, extract_mime_type_from_data_url};
use crate::error::{Error, Result};
use crate::prompts::{build_identification_prompt, build_recommendation_prompt};
use crate::types::RecommendationRequest;
use serde::{Deserialize, Serialize};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// generateContent エンドポイントURL
pub fn endpoint_url(model: &str, api_key: &str) -> String {
    format!("{}/{}:generateContent?key={}", GEMINI_API_BASE, model, api_key)
}

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            response_mime_type: "application/json".to_string(),
        }
    }
}

/// Gemini APIレスポンス
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: ResponseContent,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: String,
}

impl GeminiResponse {
    /// 最初の候補の最初のテキスト
    pub fn into_text(self) -> Result<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Api("Empty response".into()))
    }
}

/// 病害識別リクエスト（プロンプト + 画像）
pub fn identification_request(image_data_url: &str) -> Result<GeminiRequest> {
    let data = extract_base64_from_data_url(image_data_url)
        .ok_or_else(|| Error::Capture("Invalid data URL".into()))?;
    let mime_type = extract_mime_type_from_data_url(image_data_url);

    Ok(GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: build_identification_prompt(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: data.to_string(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig::default(),
    })
}

/// 防除提案リクエスト（テキストのみ）
pub fn recommendation_request(request: &RecommendationRequest) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![Part::Text {
                text: build_recommendation_prompt(request),
            }],
        }],
        generation_config: GenerationConfig::default(),
    }
}
