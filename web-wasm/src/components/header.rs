//! ヘッダーコンポーネント

use leptos::prelude::*;

#[component]
pub fn Header() -> impl IntoView {
    view! {
        <header class="header">
            <h1>"LeafScan - 葉の病害診断"</h1>
        </header>
    }
}
