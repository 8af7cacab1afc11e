//! プロンプト生成モジュール
//!
//! CLIとWeb(WASM)で共有されるプロンプト:
//! - build_identification_prompt: 病害識別（画像付き）
//! - build_recommendation_prompt: 防除提案（テキストのみ）

use crate::types::{RecommendationRequest, DISEASE_NOT_SUPPORTED, HEALTHY, UNKNOWN_PLANT};
use crate::sections::SECTION_HEADINGS;

/// 対応している作物
pub const SUPPORTED_PLANTS: &[&str] = &[
    "Beans",
    "Cotton",
    "Maize/Corn",
    "Potatoes",
    "Sunflower",
    "Tobacco",
    "Tomato",
    "Wheat",
];

/// 病害識別プロンプト
pub fn build_identification_prompt() -> String {
    let plants = SUPPORTED_PLANTS.join(", ");

    format!(
        r#"You are an expert in plant pathology. Analyze the attached image of a plant leaf and identify potential diseases.

Provide the common disease name, the scientific name, and a confidence score (0-1) for your identification.
Also tell the type of plant the leaf belongs to (e.g. {plants}).

## Rules
- If the leaf is not from one of these plants or cannot be recognized, return "{UNKNOWN_PLANT}" for plantType.
- If no disease is found, return "{HEALTHY}" for diseaseName and 1 for confidenceScore.
- If a disease is visible but you cannot identify it, return "{DISEASE_NOT_SUPPORTED}" for diseaseName.
- confidenceScore must be a number between 0 and 1.

## Output format (output ONLY this JSON object)
{{
  "diseaseName": "common name of the disease",
  "scientificName": "scientific name of the disease",
  "confidenceScore": 0.0,
  "plantType": "plant type"
}}"#
    )
}

/// 防除提案プロンプト
pub fn build_recommendation_prompt(request: &RecommendationRequest) -> String {
    let headings = SECTION_HEADINGS
        .iter()
        .map(|h| format!("- {}:", h))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert agricultural advisor. Based on the identified plant disease and crop, provide treatment recommendations, including both fungicide and organic options.
Include actionable treatment steps, specific chemical names (if applicable), and prevention tips.

Crop: {crop}
Disease: {disease}

Organize the recommendations under these headings, each on its own line:
{headings}

## Output format (output ONLY this JSON object)
{{
  "treatmentRecommendations": "the full recommendation text with the headings above"
}}"#,
        crop = request.crop_name,
        disease = request.disease_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identification_prompt_contains_sentinels() {
        let prompt = build_identification_prompt();
        assert!(prompt.contains("\"Unknown\""));
        assert!(prompt.contains("\"Healthy\""));
        assert!(prompt.contains("\"Disease not supported\""));
        assert!(prompt.contains("Maize/Corn"));
        assert!(prompt.contains("\"confidenceScore\""));
    }

    #[test]
    fn test_recommendation_prompt() {
        let prompt = build_recommendation_prompt(&RecommendationRequest {
            disease_name: "Late Blight".to_string(),
            crop_name: "Potatoes".to_string(),
        });
        assert!(prompt.contains("Crop: Potatoes"));
        assert!(prompt.contains("Disease: Late Blight"));
        assert!(prompt.contains("- Fungicide Recommendations:"));
        assert!(prompt.contains("- Organic Alternatives:"));
        assert!(prompt.contains("- Prevention Tips:"));
        assert!(prompt.contains("\"treatmentRecommendations\""));
    }
}
