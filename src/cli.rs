use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leafscan")]
#[command(about = "葉の写真から病害を判定し、防除提案と検出履歴を管理するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 履歴ファイル（省略時は設定またはデータディレクトリ）
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 葉の画像から病害を判定し、履歴に保存
    Detect {
        /// 画像ファイル (jpg/png/webp)
        #[arg(required = true)]
        image: PathBuf,
    },

    /// 検出履歴を一覧表示
    History {
        /// 病害名・植物名で絞り込み
        #[arg(short, long)]
        search: Option<String>,
    },

    /// 検出結果の詳細を表示
    Show {
        /// 検出ID
        #[arg(required = true)]
        id: String,
    },

    /// 検出履歴をすべて削除
    Clear {
        /// 確認せずに削除
        #[arg(short, long)]
        yes: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// モデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
