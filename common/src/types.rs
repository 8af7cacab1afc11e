//! 検出結果の型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - Identification: 病害識別（1回目のAI呼び出し）の出力
//! - Recommendation: 防除提案（2回目のAI呼び出し）の出力
//! - DetectionResult: 履歴に保存される1件の記録（画像 + 識別 + 提案）

use serde::{Deserialize, Serialize};

/// 植物種別が判定できなかったことを示す値
pub const UNKNOWN_PLANT: &str = "Unknown";
/// 病害なしを示す値
pub const HEALTHY: &str = "Healthy";
/// 識別プロンプトが病害なしの場合に返す値
pub const NO_DISEASE_FOUND: &str = "No disease found";
/// 対応外の病害を示す値
pub const DISEASE_NOT_SUPPORTED: &str = "Disease not supported";

/// 病害識別の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub disease_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,

    /// 0.0〜1.0
    #[serde(default)]
    pub confidence_score: f64,

    #[serde(default)]
    pub plant_type: String,
}

/// 識別結果の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 植物不明、または対応外の病害
    Unsupported,
    /// 病害なし
    Healthy,
    /// 病害あり（防除提案へ進む）
    Diseased,
}

impl Identification {
    /// センチネル文字列を判定に変換
    pub fn verdict(&self) -> Verdict {
        let disease = self.disease_name.trim();
        if self.plant_type.trim() == UNKNOWN_PLANT || disease == DISEASE_NOT_SUPPORTED {
            Verdict::Unsupported
        } else if disease == HEALTHY || disease == NO_DISEASE_FOUND {
            Verdict::Healthy
        } else {
            Verdict::Diseased
        }
    }
}

/// 防除提案
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default)]
    pub treatment_recommendations: String,
}

/// 防除提案リクエストの入力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub disease_name: String,
    pub crop_name: String,
}

impl RecommendationRequest {
    pub fn for_identification(identification: &Identification) -> Self {
        Self {
            disease_name: identification.disease_name.clone(),
            crop_name: identification.plant_type.clone(),
        }
    }
}

/// 履歴に保存される検出結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub id: String,

    /// 作成時刻（エポックミリ秒）
    pub timestamp: i64,

    /// "data:image/jpeg;base64,..." 形式
    pub image_data_url: String,

    pub identification: Identification,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Recommendation>,
}

impl DetectionResult {
    pub fn new(
        id: impl Into<String>,
        timestamp: i64,
        image_data_url: impl Into<String>,
        identification: Identification,
        recommendations: Option<Recommendation>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            image_data_url: image_data_url.into(),
            identification,
            recommendations,
        }
    }
}
