//! AIレスポンスパーサー
//!
//! Geminiのレスポンス本文からJSONを抽出し、
//! 識別結果・防除提案をパースする

use crate::error::{Error, Result};
use crate::types::{Identification, Recommendation};
use serde_json::{Map, Value};

/// レスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初の `{` から最後の `}` まで
///
/// # Examples
/// ```
/// use leafscan_common::extract_json;
///
/// let response = "Result: {\"diseaseName\": \"Rust\"} done";
/// assert_eq!(extract_json(response).unwrap(), "{\"diseaseName\": \"Rust\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

fn parse_object(response: &str) -> Result<Map<String, Value>> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("JSONパースエラー: {}", e)))?;

    // 配列で返ってきた場合は先頭要素を使う
    let value = match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Parse("JSONオブジェクトが見つかりません".into())),
    }
}

/// 識別レスポンスをパース
///
/// 信頼度は0〜1に収める。1より大きく100以下の値はパーセントとみなす。
pub fn parse_identification_response(response: &str) -> Result<Identification> {
    let map = parse_object(response)?;

    let disease_name = get_string(&map, "diseaseName")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::Parse("diseaseNameがありません".into()))?;

    let scientific_name = get_string(&map, "scientificName").filter(|s| !s.trim().is_empty());

    Ok(Identification {
        disease_name: disease_name.trim().to_string(),
        scientific_name,
        confidence_score: normalize_confidence(get_f64(&map, "confidenceScore").unwrap_or(0.0)),
        plant_type: get_string(&map, "plantType")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| crate::types::UNKNOWN_PLANT.to_string()),
    })
}

/// 防除提案レスポンスをパース
///
/// JSONでなければ本文全体を提案テキストとして扱う。
pub fn parse_recommendation_response(response: &str) -> Result<Recommendation> {
    let text = match parse_object(response) {
        Ok(map) => get_string(&map, "treatmentRecommendations")
            .ok_or_else(|| Error::Parse("treatmentRecommendationsがありません".into()))?,
        Err(_) => response.to_string(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Parse("防除提案が空です".into()));
    }

    Ok(Recommendation {
        treatment_recommendations: text.to_string(),
    })
}

fn normalize_confidence(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    let score = if score > 1.0 && score <= 100.0 {
        score / 100.0
    } else {
        score
    };
    score.clamp(0.0, 1.0)
}

fn get_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    let value = map.get(key)?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    if value.is_null() {
        return None;
    }
    Some(value.to_string())
}

fn get_f64(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = map.get(key)?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().trim_end_matches('%').parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // extract_json テスト
    // =============================================

    #[test]
    fn test_extract_json_with_block() {
        let response = "Here you go:\n```json\n{\"diseaseName\": \"Rust\"}\n```\nThanks.";
        assert_eq!(extract_json(response).unwrap(), "{\"diseaseName\": \"Rust\"}");
    }

    #[test]
    fn test_extract_json_raw_object() {
        let response = r#"{"diseaseName": "Rust", "plantType": "Beans"}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here");
        if let Err(Error::Parse(msg)) = result {
            assert!(msg.contains("JSONが見つかりません"));
        } else {
            panic!("Expected Parse error");
        }
    }

    // =============================================
    // parse_identification_response テスト
    // =============================================

    #[test]
    fn test_parse_identification() {
        let response = r#"```json
{
  "diseaseName": "Angular Leaf Spot",
  "scientificName": "Pseudocercospora griseola",
  "confidenceScore": 0.92,
  "plantType": "Beans"
}
```"#;
        let identification = parse_identification_response(response).unwrap();
        assert_eq!(identification.disease_name, "Angular Leaf Spot");
        assert_eq!(
            identification.scientific_name.as_deref(),
            Some("Pseudocercospora griseola")
        );
        assert_eq!(identification.confidence_score, 0.92);
        assert_eq!(identification.plant_type, "Beans");
    }

    #[test]
    fn test_parse_identification_array_wrapped() {
        let response = r#"[{"diseaseName": "Healthy", "confidenceScore": 1, "plantType": "Maize"}]"#;
        let identification = parse_identification_response(response).unwrap();
        assert_eq!(identification.disease_name, "Healthy");
        assert_eq!(identification.confidence_score, 1.0);
        assert!(identification.scientific_name.is_none());
    }

    #[test]
    fn test_parse_identification_confidence_normalized() {
        let percent = parse_identification_response(
            r#"{"diseaseName": "Rust", "confidenceScore": 85, "plantType": "Wheat"}"#,
        )
        .unwrap();
        assert_eq!(percent.confidence_score, 0.85);

        let too_big = parse_identification_response(
            r#"{"diseaseName": "Rust", "confidenceScore": 250, "plantType": "Wheat"}"#,
        )
        .unwrap();
        assert_eq!(too_big.confidence_score, 1.0);

        let negative = parse_identification_response(
            r#"{"diseaseName": "Rust", "confidenceScore": -0.2, "plantType": "Wheat"}"#,
        )
        .unwrap();
        assert_eq!(negative.confidence_score, 0.0);

        let text = parse_identification_response(
            r#"{"diseaseName": "Rust", "confidenceScore": "0.5", "plantType": "Wheat"}"#,
        )
        .unwrap();
        assert_eq!(text.confidence_score, 0.5);
    }

    #[test]
    fn test_parse_identification_missing_plant_is_unknown() {
        let identification =
            parse_identification_response(r#"{"diseaseName": "Rust", "confidenceScore": 0.4}"#)
                .unwrap();
        assert_eq!(identification.plant_type, "Unknown");
    }

    #[test]
    fn test_parse_identification_empty_scientific_name() {
        let identification = parse_identification_response(
            r#"{"diseaseName": "Rust", "scientificName": "", "confidenceScore": 0.4, "plantType": "Beans"}"#,
        )
        .unwrap();
        assert!(identification.scientific_name.is_none());
    }

    #[test]
    fn test_parse_identification_missing_disease() {
        let result = parse_identification_response(r#"{"plantType": "Beans"}"#);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_identification_invalid() {
        assert!(parse_identification_response("I cannot see a leaf").is_err());
        assert!(parse_identification_response("{ broken").is_err());
    }

    // =============================================
    // parse_recommendation_response テスト
    // =============================================

    #[test]
    fn test_parse_recommendation_json() {
        let response = r#"{"treatmentRecommendations": "Fungicide Recommendations: X\nOrganic Alternatives: Y"}"#;
        let recommendation = parse_recommendation_response(response).unwrap();
        assert_eq!(
            recommendation.treatment_recommendations,
            "Fungicide Recommendations: X\nOrganic Alternatives: Y"
        );
    }

    #[test]
    fn test_parse_recommendation_plain_text() {
        let response = "Prevention Tips: keep leaves dry.\n";
        let recommendation = parse_recommendation_response(response).unwrap();
        assert_eq!(recommendation.treatment_recommendations, "Prevention Tips: keep leaves dry.");
    }

    #[test]
    fn test_parse_recommendation_missing_field() {
        let result = parse_recommendation_response(r#"{"advice": "spray"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_recommendation_empty() {
        assert!(parse_recommendation_response("   ").is_err());
        assert!(parse_recommendation_response(r#"{"treatmentRecommendations": ""}"#).is_err());
    }
}
