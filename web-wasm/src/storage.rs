//! localStorage保存先

use leafscan_common::{Error, History, KeyValueBackend, Result};
use web_sys::Storage;

/// ブラウザのlocalStorage
#[derive(Clone)]
pub struct LocalStorageBackend {
    storage: Storage,
}

impl LocalStorageBackend {
    /// `window` がない、またはストレージが無効ならNone
    pub fn open() -> Option<Self> {
        let window = web_sys::window()?;
        match window.local_storage() {
            Ok(Some(storage)) => Some(Self { storage }),
            Ok(None) => None,
            Err(e) => {
                gloo::console::warn!("localStorageを利用できません", e);
                None
            }
        }
    }
}

fn storage_error(action: &str, e: wasm_bindgen::JsValue) -> Error {
    let message = format!("{}: {:?}", action, e);
    gloo::console::error!(message.clone());
    Error::Storage(message)
}

impl KeyValueBackend for LocalStorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| storage_error("読み込み失敗", e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        // 容量超過（QuotaExceededError）もここで失敗になる
        self.storage
            .set_item(key, value)
            .map_err(|e| storage_error("書き込み失敗", e))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| storage_error("削除失敗", e))
    }
}

pub type LocalHistory = History<LocalStorageBackend>;

/// 検出履歴を開く（ブラウザ外では何もしないストア）
pub fn open_history() -> LocalHistory {
    History::from_option(LocalStorageBackend::open())
}
