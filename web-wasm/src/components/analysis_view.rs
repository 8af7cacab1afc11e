//! 検出結果の詳細表示

use crate::storage::open_history;
use leafscan_common::{
    confidence_percent, split_recommendations, DetectionResult, HistoryStore, RecommendationSection,
};
use leptos::prelude::*;
use wasm_bindgen::JsValue;

/// エポックミリ秒を端末のロケールで表示
pub fn format_timestamp(millis: i64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(millis as f64));
    String::from(date.to_locale_string("ja-JP", &JsValue::UNDEFINED))
}

fn section_view(section: RecommendationSection) -> impl IntoView {
    view! {
        <div class="recommendation-section">
            {section.title.map(|title| view! { <h3>{title}</h3> })}
            <p class="recommendation-body">{section.body}</p>
        </div>
    }
}

fn detail_view(record: DetectionResult) -> impl IntoView {
    let ident = record.identification;
    let percent = confidence_percent(ident.confidence_score);
    let sections = record
        .recommendations
        .map(|r| split_recommendations(&r.treatment_recommendations))
        .unwrap_or_default();

    view! {
        <article class="analysis">
            <img class="analysis-image" src=record.image_data_url alt="撮影画像" />
            <h2>{ident.disease_name}</h2>
            {ident.scientific_name.map(|name| view! { <p class="scientific-name"><i>{name}</i></p> })}
            <dl class="analysis-meta">
                <dt>"植物"</dt>
                <dd>{ident.plant_type}</dd>
                <dt>"診断日時"</dt>
                <dd>{format_timestamp(record.timestamp)}</dd>
            </dl>
            <div class="confidence">
                <div class="confidence-bar">
                    <div class="confidence-fill" style=format!("width: {}%", percent) />
                </div>
                <span>{format!("信頼度 {}%", percent)}</span>
            </div>
            {if sections.is_empty() {
                view! { <p class="text-muted">"防除提案はありません"</p> }.into_any()
            } else {
                view! {
                    <div class="recommendations">
                        {sections.into_iter().map(section_view).collect_view()}
                    </div>
                }
                .into_any()
            }}
        </article>
    }
}

#[component]
pub fn AnalysisView<F>(id: String, on_back: F) -> impl IntoView
where
    F: Fn() + 'static + Clone,
{
    let record = open_history().get_by_id(&id);
    let back_label = if record.is_some() { "← 履歴へ戻る" } else { "履歴へ戻る" };

    view! {
        <section class="analysis-page">
            {match record {
                Some(record) => detail_view(record).into_any(),
                None => view! {
                    <div class="not-found">
                        <p>"検出結果が見つかりません"</p>
                        <p class="text-muted">"履歴が削除された可能性があります"</p>
                    </div>
                }
                .into_any(),
            }}
            <button class="btn btn-secondary" on:click=move |_| on_back()>
                {back_label}
            </button>
        </section>
    }
}
