//! 下部ナビゲーション

use crate::app::Page;
use leptos::prelude::*;

#[component]
pub fn BottomNav(page: ReadSignal<Page>, set_page: WriteSignal<Page>, disabled: Signal<bool>) -> impl IntoView {
    let tab_class = move |is_active: bool| if is_active { "nav-tab active" } else { "nav-tab" };

    view! {
        <nav class="bottom-nav">
            <button
                class=move || tab_class(page.get() == Page::Detect)
                prop:disabled=move || disabled.get()
                on:click=move |_| set_page.set(Page::Detect)
            >
                "📷 診断"
            </button>
            <button
                class=move || tab_class(matches!(page.get(), Page::History | Page::Analysis(_)))
                prop:disabled=move || disabled.get()
                on:click=move |_| set_page.set(Page::History)
            >
                "🗂 履歴"
            </button>
        </nav>
    }
}
