//! アップロードエリアコンポーネント
//!
//! カメラが使えない端末向けに、画像ファイルをData URLとして読み込む

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{File, FileReader, HtmlInputElement};

#[component]
pub fn UploadArea<F, E>(
    disabled: Signal<bool>,
    on_image: F,
    on_error: E,
) -> impl IntoView
where
    F: Fn(String) + 'static + Clone,
    E: Fn(String) + 'static + Clone,
{
    let on_change = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let file = input.files().and_then(|files| files.get(0));
        // 同じファイルを続けて選べるようにする
        input.set_value("");

        if let Some(file) = file {
            if !file.type_().starts_with("image/") {
                on_error("画像ファイルを選択してください".to_string());
                return;
            }
            read_file(file, on_image.clone(), on_error.clone());
        }
    };

    view! {
        <label class=move || if disabled.get() { "upload-area disabled" } else { "upload-area" }>
            <input
                type="file"
                accept="image/*"
                class="visually-hidden"
                prop:disabled=move || disabled.get()
                on:change=on_change
            />
            <span class="upload-icon">"🖼"</span>
            <span>"画像ファイルを選択"</span>
        </label>
    }
}

fn read_file<F, E>(file: File, on_image: F, on_error: E)
where
    F: Fn(String) + 'static,
    E: Fn(String) + 'static + Clone,
{
    let reader = match FileReader::new() {
        Ok(reader) => reader,
        Err(e) => {
            gloo::console::error!("FileReaderを作成できません", e);
            on_error("画像を読み込めませんでした".to_string());
            return;
        }
    };

    let reader_clone = reader.clone();
    let on_load_error = on_error.clone();
    let onload = Closure::once(move |_: web_sys::ProgressEvent| {
        match reader_clone.result().ok().and_then(|r| r.as_string()) {
            Some(data_url) => on_image(data_url),
            None => on_load_error("画像を読み込めませんでした".to_string()),
        }
    });

    let onerror = Closure::once(move |_: web_sys::ProgressEvent| {
        on_error("画像を読み込めませんでした".to_string());
    });

    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();

    if let Err(e) = reader.read_as_data_url(&file) {
        gloo::console::error!("read_as_data_url 失敗", e);
    }
}
