//! 履歴一覧・詳細の表示

use chrono::{DateTime, Local};
use leafscan_common::{confidence_percent, split_recommendations, DetectionResult};

/// エポックミリ秒をローカル日時に
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// 一覧の1行
pub fn summary_line(record: &DetectionResult) -> String {
    let identification = &record.identification;
    format!(
        "{:<15} {}  {} / {} ({}%)",
        record.id,
        format_timestamp(record.timestamp),
        identification.disease_name,
        identification.plant_type,
        confidence_percent(identification.confidence_score),
    )
}

/// 詳細表示
pub fn detail(record: &DetectionResult) -> String {
    let identification = &record.identification;
    let percent = confidence_percent(identification.confidence_score);
    let bar_len = (percent / 5) as usize;

    let mut out = String::new();
    out.push_str(&format!("病害名: {}\n", identification.disease_name));
    if let Some(scientific) = &identification.scientific_name {
        out.push_str(&format!("学名: {}\n", scientific));
    }
    out.push_str(&format!("植物: {}\n", identification.plant_type));
    out.push_str(&format!("日時: {}\n", format_timestamp(record.timestamp)));
    out.push_str(&format!(
        "信頼度: [{}{}] {}%\n",
        "#".repeat(bar_len),
        "-".repeat(20 - bar_len),
        percent
    ));

    if let Some(recommendations) = &record.recommendations {
        for section in split_recommendations(&recommendations.treatment_recommendations) {
            out.push('\n');
            match &section.title {
                Some(title) => out.push_str(&format!("■ {}\n", title)),
                None => out.push_str("■ 防除提案\n"),
            }
            for line in section.body.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }

    out
}
