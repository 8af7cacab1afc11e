//! 処理中オーバーレイ

use leafscan_common::FlowState;
use leptos::prelude::*;

fn label(state: FlowState) -> &'static str {
    match state {
        FlowState::Capturing => "画像を取得中...",
        FlowState::Identifying => "病害を識別中...",
        FlowState::Recommending => "防除提案を作成中...",
        _ => "",
    }
}

#[component]
pub fn Loader(state: ReadSignal<FlowState>) -> impl IntoView {
    view! {
        <Show when=move || state.get().is_busy()>
            <div class="loader-overlay" role="status" aria-live="polite">
                <div class="spinner" />
                <p class="loader-text">{move || label(state.get())}</p>
            </div>
        </Show>
    }
}
