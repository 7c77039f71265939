use log::info;
use tcp_segment_decoder::config::AppConfig;
use tcp_segment_decoder::error::AppError;
use tcp_segment_decoder::segment_processor::process_lines;
use tcp_segment_decoder::setup_logger::setup_logger;
use tokio::io::{self, BufReader};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    setup_logger(&config.log)?;
    info!("出力形式: {:?}", config.output.format);

    // 標準入力から1行1セグメントの16進文字列を読み込む
    let reader = BufReader::new(io::stdin());
    let mut writer = io::stdout();
    let stats = process_lines(reader, &mut writer, config.output.format).await?;

    info!(
        "処理が完了しました: デコード{}件 スキップ{}件 合計{}バイト",
        stats.decoded, stats.skipped, stats.total_bytes
    );

    Ok(())
}
