use crate::config::LogConfig;
use crate::error::InitProcessError;
use env_logger::{Builder, Target};
use std::fs::File;
use std::io::Write;

fn build_logger(config: &LogConfig) -> Result<Builder, InitProcessError> {
    let mut builder = Builder::new();

    builder
        // ログレベルの設定
        .filter_level(config.level)
        // タイムスタンプ付きのフォーマット
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    // 標準出力はデコード結果に使うので、ログはファイルか標準エラー出力へ
    match &config.file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                InitProcessError::LoggerError(format!("{}: {}", path.display(), e))
            })?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    Ok(builder)
}

pub fn setup_logger(config: &LogConfig) -> Result<(), InitProcessError> {
    build_logger(config)?
        .try_init()
        .map_err(|e| InitProcessError::LoggerError(e.to_string()))
}
