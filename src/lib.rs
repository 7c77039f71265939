//! パケットキャプチャから取り出したTCPセグメントをヘッダー、フラグ、オプション、ペイロードにデコードする。

pub mod config;
pub mod error;
pub mod segment_processor;
pub mod setup_logger;
pub mod tcp;

pub use error::{AppError, DecodeError};
pub use tcp::{decode, decode_bytes, length_in_bytes, serialize, DecodedTcpSegment, TcpFlags};
