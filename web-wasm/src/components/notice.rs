//! 通知表示

use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

/// 画面上部に出す通知。`seq` は自動消去の取り違え防止用
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub seq: u32,
    pub kind: NoticeKind,
    pub message: String,
}

#[component]
pub fn NoticeBar(notice: ReadSignal<Option<Notice>>, set_notice: WriteSignal<Option<Notice>>) -> impl IntoView {
    move || {
        notice.get().map(|n| {
            view! {
                <div class=format!("notice notice-{}", n.kind.as_str()) role="alert">
                    <span>{n.message}</span>
                    <button class="notice-close" on:click=move |_| set_notice.set(None)>
                        "×"
                    </button>
                </div>
            }
        })
    }
}
