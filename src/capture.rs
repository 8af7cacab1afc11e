//! 画像ファイルの読み込み
//!
//! 画像ファイルをData URLに変換して検出フローへ渡す。
//! 縮小・補正などの前処理は行わない。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use leafscan_common::{build_data_url, Error, ImageSource, Result};
use std::path::{Path, PathBuf};

/// 拡張子とMIMEタイプの対応
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
];

/// 拡張子からMIMEタイプを判定
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// 画像ファイルをData URLに変換
pub fn load_data_url(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::Capture(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }

    let mime_type = mime_type_for(path).ok_or_else(|| {
        Error::Capture(format!("対応していない画像形式です: {}", path.display()))
    })?;

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(Error::Capture(format!("画像が空です: {}", path.display())));
    }

    Ok(build_data_url(mime_type, &STANDARD.encode(bytes)))
}

/// ファイルからの画像取得
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileImageSource {
    async fn capture(&mut self) -> Result<String> {
        log::debug!("画像を読み込み: {}", self.path.display());
        load_data_url(&self.path)
    }
}
