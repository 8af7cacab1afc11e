//! Gemini API連携（fetch）
//!
//! 病害識別: 画像 + プロンプト -> Identification
//! 防除提案: 病害名 + 作物名 -> Recommendation

use leafscan_common::gemini::{
    endpoint_url, identification_request, recommendation_request, GeminiRequest, GeminiResponse,
    DEFAULT_MODEL,
};
use leafscan_common::{
    parse_identification_response, parse_recommendation_response, Error, Identification,
    Identifier, Recommendation, RecommendationRequest, Recommender, Result,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

fn js_error(e: JsValue) -> Error {
    Error::Api(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

/// Gemini API呼び出し（共通処理）
async fn call_gemini_api(api_key: &str, model: &str, request: &GeminiRequest) -> Result<String> {
    let url = endpoint_url(model, api_key);
    let body = serde_json::to_string(request)?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&JsValue::from_str(&body));

    let request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(js_error)?;

    let window = web_sys::window().ok_or_else(|| Error::Api("window がありません".into()))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let resp: Response = resp_value.dyn_into().map_err(js_error)?;

    if !resp.ok() {
        return Err(Error::Api(format!("API error: {}", resp.status())));
    }

    let json = JsFuture::from(resp.json().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    let response: GeminiResponse = serde_wasm_bindgen::from_value(json)
        .map_err(|e| Error::Api(format!("レスポンスが不正です: {}", e)))?;

    response.into_text()
}

/// fetchによるGeminiクライアント
#[derive(Clone)]
pub struct GeminiFetchClient {
    api_key: String,
    model: String,
}

impl GeminiFetchClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Identifier for GeminiFetchClient {
    async fn identify(&self, image_data_url: &str) -> Result<Identification> {
        let request = identification_request(image_data_url)?;
        let text = call_gemini_api(&self.api_key, &self.model, &request).await?;
        parse_identification_response(&text)
    }
}

impl Recommender for GeminiFetchClient {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        let text = call_gemini_api(&self.api_key, &self.model, &recommendation_request(request)).await?;
        parse_recommendation_response(&text)
    }
}
