//! カメラ撮影コンポーネント
//!
//! 背面カメラのプレビューを表示し、現在のフレームをJPEGのData URLとして取り出す。
//! ストリームはコンポーネント破棄時に必ず停止する。

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, DomException, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};

/// 取得中のカメラストリーム。破棄時に全トラックを停止する
struct CameraStream(MediaStream);

impl Drop for CameraStream {
    fn drop(&mut self) {
        for track in self.0.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

/// getUserMediaの失敗を利用者向けの文言にする
fn camera_error_message(e: &JsValue) -> String {
    let name = e.dyn_ref::<DomException>().map(|d| d.name());
    match name.as_deref() {
        Some("NotAllowedError") | Some("SecurityError") => {
            "カメラへのアクセスが許可されていません。ブラウザの設定を確認してください".to_string()
        }
        Some("NotFoundError") | Some("OverconstrainedError") => {
            "カメラが見つかりません。画像ファイルを選択してください".to_string()
        }
        Some("NotReadableError") => "カメラを使用できません。他のアプリを閉じてください".to_string(),
        _ => "カメラを起動できませんでした".to_string(),
    }
}

async fn open_camera() -> Result<MediaStream, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window がありません"))?;
    let devices = window.navigator().media_devices()?;

    let video = js_sys::Object::new();
    js_sys::Reflect::set(&video, &"facingMode".into(), &"environment".into())?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video);
    constraints.set_audio(&JsValue::FALSE);

    let stream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?).await?;
    stream.dyn_into::<MediaStream>()
}

/// 現在のフレームをJPEGのData URLにする
fn capture_frame(video: &HtmlVideoElement) -> Result<String, JsValue> {
    let (width, height) = (video.video_width(), video.video_height());
    if width == 0 || height == 0 {
        return Err(JsValue::from_str("映像がまだ準備できていません"));
    }

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document がありません"))?;
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_width(width);
    canvas.set_height(height);

    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2Dコンテキストを取得できません"))?
        .dyn_into()?;
    context.draw_image_with_html_video_element(video, 0.0, 0.0)?;

    canvas.to_data_url_with_type("image/jpeg")
}

#[component]
pub fn CameraView<F, E>(
    disabled: Signal<bool>,
    on_capture: F,
    on_error: E,
) -> impl IntoView
where
    F: Fn(String) + 'static,
    E: Fn(String) + 'static,
{
    let video_ref: NodeRef<leptos::html::Video> = NodeRef::new();
    let stream = StoredValue::new_local(None::<CameraStream>);
    let (camera_error, set_camera_error) = signal(None::<String>);
    let (is_ready, set_is_ready) = signal(false);

    let start = move || {
        let Some(video) = video_ref.get_untracked() else {
            return;
        };
        set_camera_error.set(None);
        set_is_ready.set(false);
        // 以前のストリームを先に止める
        stream.update_value(|s| *s = None);

        spawn_local(async move {
            match open_camera().await {
                Ok(media) => {
                    video.set_src_object(Some(&media));
                    if let Err(e) = video.play() {
                        gloo::console::warn!("video.play() 失敗", e);
                    }
                    stream.set_value(Some(CameraStream(media)));
                    set_is_ready.set(true);
                }
                Err(e) => {
                    gloo::console::warn!("getUserMedia 失敗", e.clone());
                    set_camera_error.set(Some(camera_error_message(&e)));
                }
            }
        });
    };

    // video要素のマウント後に1度だけ起動する
    Effect::new(move |started: Option<bool>| {
        if started == Some(true) {
            return true;
        }
        if video_ref.get().is_some() {
            start();
            true
        } else {
            false
        }
    });

    on_cleanup(move || {
        stream.try_update_value(|s| *s = None);
    });

    let on_shutter = move |_| {
        let Some(video) = video_ref.get_untracked() else {
            return;
        };
        match capture_frame(&video) {
            Ok(data_url) => on_capture(data_url),
            Err(e) => {
                gloo::console::warn!("撮影失敗", e);
                on_error("撮影に失敗しました。もう一度お試しください".to_string());
            }
        }
    };

    view! {
        <div class="camera-view">
            <video
                node_ref=video_ref
                class=move || if camera_error.get().is_some() { "camera-preview hidden" } else { "camera-preview" }
                autoplay=true
                playsinline=true
                prop:muted=true
            />
            <Show when=move || camera_error.get().is_some()>
                <div class="camera-error">
                    <p>{move || camera_error.get().unwrap_or_default()}</p>
                    <button class="btn btn-secondary" on:click=move |_| start()>
                        "再試行"
                    </button>
                </div>
            </Show>
            <button
                class="btn btn-primary shutter"
                prop:disabled=move || disabled.get() || !is_ready.get()
                on:click=on_shutter
            >
                "📷 撮影して診断"
            </button>
        </div>
    }
}
