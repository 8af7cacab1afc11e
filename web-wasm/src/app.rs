//! メインアプリケーションコンポーネント

use crate::api::gemini::GeminiFetchClient;
use crate::components::{
    analysis_view::AnalysisView,
    camera_view::CameraView,
    header::Header,
    history_list::HistoryList,
    loader::Loader,
    nav::BottomNav,
    notice::{Notice, NoticeBar, NoticeKind},
    settings_panel::SettingsPanel,
    upload_area::UploadArea,
};
use crate::storage::open_history;
use gloo::timers::callback::Timeout;
use leafscan_common::{DataUrlSource, DetectionFlow, FlowOutcome, FlowState};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 通知の表示時間（ミリ秒）
const NOTICE_DURATION_MS: u32 = 6_000;

/// 表示中の画面
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Page {
    Detect,
    History,
    Analysis(String),
}

/// Idleなら処理中に切り替えてtrue。既に処理中ならfalse
fn claim_flow(state: ReadSignal<FlowState>, set_state: WriteSignal<FlowState>) -> bool {
    if state.get_untracked().is_busy() {
        return false;
    }
    set_state.set(FlowState::Capturing);
    true
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    // アプリケーション状態
    let (api_key, set_api_key) = signal(String::new());
    let (page, set_page) = signal(Page::Detect);
    let (flow_state, set_flow_state) = signal(FlowState::Idle);
    let (notice, set_notice) = signal(None::<Notice>);
    let notice_seq = StoredValue::new(0u32);

    let is_busy = Signal::derive(move || flow_state.get().is_busy());
    let can_detect = Signal::derive(move || !api_key.get().is_empty() && !flow_state.get().is_busy());
    let detect_disabled = Signal::derive(move || !can_detect.get());

    // 通知を出し、一定時間後に消す
    let notify = move |kind: NoticeKind, message: String| {
        notice_seq.update_value(|s| *s = s.wrapping_add(1));
        let seq = notice_seq.get_value();
        set_notice.set(Some(Notice { seq, kind, message }));
        Timeout::new(NOTICE_DURATION_MS, move || {
            if notice.get_untracked().map(|n| n.seq) == Some(seq) {
                set_notice.set(None);
            }
        })
        .forget();
    };

    // 画像1枚分の検出を実行
    let on_image = move |data_url: String| {
        if api_key.get_untracked().is_empty() {
            notify(NoticeKind::Warning, "先にGemini APIキーを入力してください".to_string());
            return;
        }
        // spawn前に処理中へ切り替え、連続した撮影で2本目を起動しない
        if !claim_flow(flow_state, set_flow_state) {
            return;
        }

        let client = GeminiFetchClient::new(api_key.get_untracked());
        spawn_local(async move {
            let flow = DetectionFlow::new(open_history(), || js_sys::Date::now() as i64)
                .with_observer(move |state| set_flow_state.set(state));
            let mut source = DataUrlSource(data_url);

            match flow.run(&mut source, &client, &client).await {
                FlowOutcome::Stored { id } => {
                    set_page.set(Page::Analysis(id));
                }
                FlowOutcome::Healthy(ident) => {
                    notify(
                        NoticeKind::Info,
                        format!("{}: 病害は見つかりませんでした", ident.plant_type),
                    );
                }
                FlowOutcome::Unsupported(_) => {
                    notify(
                        NoticeKind::Warning,
                        "植物を識別できないか、対応していない病害です。葉を大きく写して再度お試しください"
                            .to_string(),
                    );
                }
                FlowOutcome::Failed(e) => {
                    gloo::console::error!(format!("検出に失敗: {}", e));
                    notify(NoticeKind::Error, "診断に失敗しました。もう一度お試しください".to_string());
                }
            }
            // 次の試行に備えてIdleへ戻す
            set_flow_state.set(FlowState::Idle);
        });
    };

    let on_error = move |message: String| notify(NoticeKind::Error, message);

    view! {
        <div class="container">
            <Header />
            <NoticeBar notice=notice set_notice=set_notice />

            <main class="content">
                {move || match page.get() {
                    Page::Detect => view! {
                        <SettingsPanel api_key=api_key set_api_key=set_api_key />
                        <Show when=move || api_key.get().is_empty()>
                            <p class="text-muted">"Gemini APIキーを入力すると診断できます"</p>
                        </Show>
                        <CameraView disabled=detect_disabled on_capture=on_image on_error=on_error />
                        <UploadArea disabled=detect_disabled on_image=on_image on_error=on_error />
                    }
                    .into_any(),
                    Page::History => view! {
                        <HistoryList on_select=move |id| set_page.set(Page::Analysis(id)) />
                    }
                    .into_any(),
                    Page::Analysis(id) => view! {
                        <AnalysisView id=id on_back=move || set_page.set(Page::History) />
                    }
                    .into_any(),
                }}
            </main>

            <BottomNav page=page set_page=set_page disabled=is_busy />
            <Loader state=flow_state />
        </div>
    }
}
