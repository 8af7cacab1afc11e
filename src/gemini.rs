//! Gemini API クライアント（reqwest）
//!
//! 病害識別と防除提案の2つの呼び出しを行う。
//! リトライ・タイムアウトは設けない。

use leafscan_common::gemini::{
    endpoint_url, identification_request, recommendation_request, GeminiRequest, GeminiResponse,
};
use leafscan_common::{
    parse_identification_response, parse_recommendation_response, Error, Identification,
    Identifier, Recommendation, RecommendationRequest, Recommender, Result,
};

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GeminiRequest) -> Result<String> {
        // URLにAPIキーが含まれるため、エラー文からURLを除く
        let response = self
            .http
            .post(endpoint_url(&self.model, &self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Api(format!("リクエスト失敗: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("API error {}: {}", status, text)));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(format!("レスポンスが不正です: {}", e.without_url())))?;

        let text = payload.into_text()?;
        log::debug!("レスポンス長: {} chars", text.len());
        Ok(text)
    }
}

impl Identifier for GeminiClient {
    async fn identify(&self, image_data_url: &str) -> Result<Identification> {
        let request = identification_request(image_data_url)?;
        let text = self.generate(&request).await?;
        parse_identification_response(&text)
    }
}

impl Recommender for GeminiClient {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        let text = self.generate(&recommendation_request(request)).await?;
        parse_recommendation_response(&text)
    }
}
