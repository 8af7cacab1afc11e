//! 履歴一覧・詳細表示用の補助関数
//!
//! 表示側はストアを読むだけで、記録を書き換えない。

use crate::types::DetectionResult;

/// 病害名または植物種別の部分一致（大文字小文字無視）で絞り込み
///
/// 空の検索語なら全件を返す。
pub fn filter_history<'a>(records: &'a [DetectionResult], query: &str) -> Vec<&'a DetectionResult> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|r| {
            r.identification.disease_name.to_lowercase().contains(&query)
                || r.identification.plant_type.to_lowercase().contains(&query)
        })
        .collect()
}

/// 信頼度をパーセント表示用に変換
pub fn confidence_percent(score: f64) -> u32 {
    (score * 100.0).round().clamp(0.0, 100.0) as u32
}
