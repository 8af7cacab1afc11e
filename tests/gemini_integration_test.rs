use leafscan::gemini::GeminiClient;
use leafscan_common::{split_recommendations, RecommendationRequest, Recommender};

#[tokio::test]
async fn gemini_recommendation_integration() {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            return;
        }
    };

    let client = GeminiClient::new(api_key, leafscan_common::gemini::DEFAULT_MODEL);
    let recommendation = client
        .recommend(&RecommendationRequest {
            disease_name: "Angular Leaf Spot".to_string(),
            crop_name: "Beans".to_string(),
        })
        .await
        .expect("recommendation request failed");

    assert!(!recommendation.treatment_recommendations.trim().is_empty());
    assert!(!split_recommendations(&recommendation.treatment_recommendations).is_empty());
}
