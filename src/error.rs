use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("TCPヘッダーが途中で切れています: {needed}バイト必要ですが{available}バイトしかありません")]
    TruncatedHeader { needed: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum InitProcessError {
    #[error("ロガーのセットアップに失敗しました: {0}")]
    LoggerError(String),

    #[error("環境変数の解析に失敗しました: {0}")]
    EnvVarParseError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("初期化エラー: {0}")]
    Init(#[from] InitProcessError),

    #[error("デコードエラー: {0}")]
    Decode(#[from] DecodeError),

    #[error("入力形式エラー: {0}")]
    InvalidInput(String),

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON変換エラー: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_header_message() {
        let err = DecodeError::TruncatedHeader { needed: 20, available: 19 };
        assert_eq!(
            err.to_string(),
            "TCPヘッダーが途中で切れています: 20バイト必要ですが19バイトしかありません"
        );
    }

    #[test]
    fn test_decode_error_converts_into_app_error() {
        let err: AppError = DecodeError::TruncatedHeader { needed: 24, available: 22 }.into();
        assert!(matches!(
            err,
            AppError::Decode(DecodeError::TruncatedHeader { needed: 24, available: 22 })
        ));
    }
}
