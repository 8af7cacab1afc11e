//! 検出履歴一覧
//!
//! 検索語で病害名・植物名を絞り込む。全削除は画面内で確認してから行う

use crate::components::analysis_view::format_timestamp;
use crate::storage::open_history;
use leafscan_common::{confidence_percent, filter_history, DetectionResult, HistoryStore};
use leptos::prelude::*;

#[component]
pub fn HistoryList<F>(on_select: F) -> impl IntoView
where
    F: Fn(String) + 'static + Clone + Send + Sync,
{
    let (records, set_records) = signal(open_history().get_all());
    let (query, set_query) = signal(String::new());
    let (confirming, set_confirming) = signal(false);

    let visible = move || {
        records.with(|all| {
            filter_history(all, &query.get())
                .into_iter()
                .cloned()
                .collect::<Vec<DetectionResult>>()
        })
    };

    let on_clear = move |_| {
        open_history().clear();
        set_records.set(open_history().get_all());
        set_confirming.set(false);
    };

    view! {
        <section class="history">
            <div class="history-toolbar">
                <input
                    type="search"
                    class="search-input"
                    placeholder="病害名・植物名で検索"
                    prop:value=move || query.get()
                    on:input=move |ev| set_query.set(event_target_value(&ev))
                />
                <Show when=move || !records.with(|r| r.is_empty())>
                    <button class="btn btn-tertiary btn-small" on:click=move |_| set_confirming.set(true)>
                        "全削除"
                    </button>
                </Show>
            </div>

            <Show when=move || confirming.get()>
                <div class="confirm-box">
                    <p>"すべての履歴を削除します。よろしいですか？"</p>
                    <button class="btn btn-tertiary btn-small" on:click=on_clear>
                        "削除する"
                    </button>
                    <button class="btn btn-secondary btn-small" on:click=move |_| set_confirming.set(false)>
                        "キャンセル"
                    </button>
                </div>
            </Show>

            <Show
                when=move || !visible().is_empty()
                fallback=move || {
                    let message = if records.with(|r| r.is_empty()) {
                        "まだ履歴がありません"
                    } else {
                        "該当する履歴がありません"
                    };
                    view! { <p class="text-muted">{message}</p> }
                }
            >
                <ul class="history-items">
                    <For
                        each=visible
                        key=|record| record.id.clone()
                        children={
                            let on_select = on_select.clone();
                            move |record: DetectionResult| {
                                let on_select = on_select.clone();
                                let id = record.id.clone();
                                view! {
                                    <li class="history-item" on:click=move |_| on_select(id.clone())>
                                        <img class="thumb" src=record.image_data_url.clone() alt="" />
                                        <div class="history-meta">
                                            <strong>{record.identification.disease_name.clone()}</strong>
                                            <span class="text-muted">{record.identification.plant_type.clone()}</span>
                                            <span class="text-muted">
                                                {format!(
                                                    "{} ・ 信頼度 {}%",
                                                    format_timestamp(record.timestamp),
                                                    confidence_percent(record.identification.confidence_score),
                                                )}
                                            </span>
                                        </div>
                                    </li>
                                }
                            }
                        }
                    />
                </ul>
            </Show>
        </section>
    }
}
