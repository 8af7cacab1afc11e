use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use leafscan::capture::{self, FileImageSource};
use leafscan::cli::{Cli, Commands};
use leafscan::config::Config;
use leafscan::error::LeafscanError;
use leafscan::gemini::GeminiClient;
use leafscan::{report, storage};
use leafscan_common::{filter_history, DetectionFlow, FlowOutcome, FlowState, HistoryStore};

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = Config::load().context("設定ファイルを読み込めません")?;

    let store_path = match cli.store.clone() {
        Some(path) => Some(path),
        None => match config.store_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        },
    };
    let history = storage::open_history(store_path);

    match cli.command {
        Commands::Detect { image } => {
            println!("🌿 leafscan - 病害検出\n");

            if !image.is_file() {
                return Err(LeafscanError::FileNotFound(image.display().to_string()).into());
            }
            if capture::mime_type_for(&image).is_none() {
                return Err(LeafscanError::UnsupportedImage(image.display().to_string()).into());
            }

            let client = GeminiClient::new(config.get_api_key()?, config.model.clone());
            log::debug!("モデル: {}", client.model());
            let flow = DetectionFlow::new(history, now_millis).with_observer(|state| match state {
                FlowState::Capturing => println!("[1/3] 画像を読み込み中..."),
                FlowState::Identifying => println!("[2/3] 病害を識別中..."),
                FlowState::Recommending => println!("[3/3] 防除提案を取得中..."),
                _ => {}
            });

            let mut source = FileImageSource::new(&image);
            match flow.run(&mut source, &client, &client).await {
                FlowOutcome::Stored { id } => {
                    println!("✔ 履歴に保存: {}\n", id);
                    if let Some(record) = flow.store().get_by_id(&id) {
                        print!("{}", report::detail(&record));
                    }
                    println!("\n✅ 検出完了");
                }
                FlowOutcome::Healthy(identification) => {
                    println!(
                        "\n✅ 健康な葉です（{}）。病害は検出されませんでした",
                        identification.plant_type
                    );
                }
                FlowOutcome::Unsupported(_) => {
                    println!("\n⚠ 病害を判定できませんでした。現在のモデルでは対応していません。別の画像でお試しください");
                }
                FlowOutcome::Failed(e) => {
                    return Err(LeafscanError::from(e)).context("解析に失敗しました。もう一度お試しください");
                }
            }
        }

        Commands::History { search } => {
            let records = history.get_all();
            let query = search.unwrap_or_default();
            let filtered = filter_history(&records, &query);

            if filtered.is_empty() {
                if query.trim().is_empty() {
                    println!("履歴がありません。`leafscan detect <画像>` で検出を開始してください");
                } else {
                    println!("「{}」に一致する履歴はありません", query.trim());
                }
            } else {
                for record in &filtered {
                    println!("{}", report::summary_line(record));
                }
                println!("\n{}件", filtered.len());
            }
        }

        Commands::Show { id } => {
            let record = history
                .get_by_id(&id)
                .ok_or_else(|| LeafscanError::RecordNotFound(id.clone()))?;
            print!("{}", report::detail(&record));
        }

        Commands::Clear { yes } => {
            let count = history.get_all().len();
            if count == 0 {
                println!("履歴がありません");
                return Ok(());
            }

            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!(
                        "{}件の検出履歴をすべて削除します。元に戻せません。よろしいですか？",
                        count
                    ))
                    .default(false)
                    .interact()
                    .context("確認入力に失敗しました")?;

            if confirmed {
                history.clear();
                println!("✔ 履歴を削除しました");
            } else {
                println!("キャンセルしました");
            }
        }

        Commands::Config { set_api_key, set_model, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ モデルを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
                match config.store_path() {
                    Ok(path) => println!("  履歴ファイル: {}", path.display()),
                    Err(_) => println!("  履歴ファイル: (なし)"),
                }
            }
        }
    }

    Ok(())
}
