//! 検出履歴ストア
//!
//! 検出結果の一覧を1つのキーの下にJSON配列（新しい順）として保存する。
//! 保存先はブラウザのlocalStorageと同じ形のキーバリュー抽象（KeyValueBackend）で、
//! ファイル・localStorage・メモリを差し替えられる。
//!
//! 履歴は補助機能なので、保存先の障害はログに記録して握りつぶす。
//! 呼び出し側にエラーを返すことはない。

use crate::error::{Error, Result};
use crate::types::DetectionResult;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// 履歴を保存するキー
pub const HISTORY_KEY: &str = "AGRISMART-detectionHistory";

/// localStorage互換のキーバリュー保存先
pub trait KeyValueBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// 検出履歴の操作
///
/// 記録は追加のみで更新はできない。返す値は常にコピー。
pub trait HistoryStore {
    /// 全件を新しい順で返す（読めなければ空）
    fn get_all(&self) -> Vec<DetectionResult>;

    /// IDで1件取得
    fn get_by_id(&self, id: &str) -> Option<DetectionResult> {
        self.get_all().into_iter().find(|r| r.id == id)
    }

    /// 先頭に追加して一覧全体を書き込む
    ///
    /// ID重複・保存先なし・書き込み失敗のときは `false`
    fn add(&self, record: DetectionResult) -> bool;

    /// 全件削除
    fn clear(&self);
}

/// キーバリュー保存先の上に構築した履歴ストア
///
/// 保存先がない場合（SSR中・ストレージ無効など）は全操作が何もしない。
#[derive(Debug, Clone)]
pub struct History<B> {
    backend: Option<B>,
    key: String,
}

impl<B: KeyValueBackend> History<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, HISTORY_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend: Some(backend),
            key: key.into(),
        }
    }

    /// 保存先なし
    pub fn detached() -> Self {
        Self {
            backend: None,
            key: HISTORY_KEY.to_string(),
        }
    }

    /// 保存先があれば接続、なければ何もしないストア
    pub fn from_option(backend: Option<B>) -> Self {
        match backend {
            Some(b) => Self::new(b),
            None => Self::detached(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn write(&self, backend: &B, records: &[DetectionResult]) -> bool {
        let json = match serde_json::to_string(records) {
            Ok(json) => json,
            Err(e) => {
                log::error!("履歴のシリアライズに失敗: {}", e);
                return false;
            }
        };

        match backend.set_item(&self.key, &json) {
            Ok(()) => true,
            Err(e) => {
                log::error!("履歴の書き込みに失敗: {}", e);
                false
            }
        }
    }
}

impl<B: KeyValueBackend> HistoryStore for History<B> {
    fn get_all(&self) -> Vec<DetectionResult> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };

        let json = match backend.get_item(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("履歴の読み込みに失敗: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("履歴データが壊れています。空として扱います: {}", e);
                Vec::new()
            }
        }
    }

    fn add(&self, record: DetectionResult) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };

        // JSONではnullになり、一覧全体が読めなくなる
        if !record.identification.confidence_score.is_finite() {
            log::warn!("ID {} の信頼度が数値ではないため追加しません", record.id);
            return false;
        }

        let mut records = self.get_all();
        if records.iter().any(|r| r.id == record.id) {
            log::warn!("ID {} は既に履歴に存在するため追加しません", record.id);
            return false;
        }

        records.insert(0, record);
        self.write(backend, &records)
    }

    fn clear(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        if let Err(e) = backend.remove_item(&self.key) {
            log::error!("履歴の削除に失敗: {}", e);
        }
    }
}

/// メモリ上の保存先（テスト・一時利用）
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生の値を入れた状態で作成
    pub fn with_item(key: &str, value: &str) -> Self {
        let backend = Self::default();
        backend
            .items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        backend
    }

    /// 書き込みを失敗させる（容量超過の再現）
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Storage("quota exceeded".into()));
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// メモリ上の履歴ストア
pub type MemoryHistory = History<MemoryBackend>;

impl MemoryHistory {
    pub fn in_memory() -> Self {
        History::new(MemoryBackend::new())
    }
}
