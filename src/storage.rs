//! ファイル保存先
//!
//! ブラウザのlocalStorageと同じく「キー → 文字列」の表を1つのJSONファイルに持つ。
//! 書き込みは一時ファイルへ書いてからリネームするので、
//! 読み手が書きかけのファイルを見ることはない。

use leafscan_common::{Error, History, KeyValueBackend, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

type Items = BTreeMap<String, String>;

/// JSONファイルによるキーバリュー保存先
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイル全体を読む（なければ空）
    fn load(&self) -> Result<Items> {
        if !self.path.exists() {
            return Ok(Items::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| Error::Storage(format!("{} が壊れています: {}", self.path.display(), e)))
    }

    /// 書き込み前の読み込み。壊れていれば作り直す
    fn load_for_write(&self) -> Items {
        match self.load() {
            Ok(items) => items,
            Err(e) => {
                log::warn!("{}。新しく作成します", e);
                Items::new()
            }
        }
    }

    fn save(&self, items: &Items) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, items)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.load_for_write();
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut items = self.load_for_write();
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}

/// ファイルに保存する履歴ストア
pub type FileHistory = History<FileBackend>;

/// 履歴ストアを開く。保存先が決まらなければ何もしないストアを返す
pub fn open_history(path: Option<PathBuf>) -> FileHistory {
    match path {
        Some(path) => {
            log::debug!("履歴ファイル: {}", path.display());
            History::new(FileBackend::new(path))
        }
        None => {
            log::warn!("履歴の保存先がないため、履歴は保存されません");
            History::detached()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_none() {
        let dir = tempdir().expect("Failed to create temp dir");
        let backend = FileBackend::new(dir.path().join("storage.json"));
        assert_eq!(backend.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempdir().expect("Failed to create temp dir");
        let backend = FileBackend::new(dir.path().join("sub").join("storage.json"));

        backend.set_item("a", "1").unwrap();
        backend.set_item("b", "[2]").unwrap();
        assert_eq!(backend.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(backend.get_item("b").unwrap().as_deref(), Some("[2]"));

        backend.remove_item("a").unwrap();
        assert_eq!(backend.get_item("a").unwrap(), None);
        // 他のキーは残る
        assert_eq!(backend.get_item("b").unwrap().as_deref(), Some("[2]"));
        // 一時ファイルは残らない
        assert!(!dir.path().join("sub").join("storage.json.tmp").exists());
    }

    #[test]
    fn test_remove_without_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("storage.json");
        let backend = FileBackend::new(&path);
        backend.remove_item("a").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let backend = FileBackend::new(&path);
        assert!(matches!(backend.get_item("a"), Err(Error::Storage(_))));

        // 書き込みで作り直される
        backend.set_item("a", "1").unwrap();
        assert_eq!(backend.get_item("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_open_history_detached() {
        let history = open_history(None);
        assert!(!history.is_attached());
    }
}
