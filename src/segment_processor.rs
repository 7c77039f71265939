use crate::config::OutputFormat;
use crate::error::{AppError, Result};
use crate::tcp::{decode, length_in_bytes, serialize, DecodedTcpSegment};
use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub decoded: usize,
    pub skipped: usize,
    pub total_bytes: usize,
}

/// 16進文字列を1セグメント分のバイト列に変換する。空白と先頭の `0x` は無視する。
pub fn parse_hex_line(line: &str) -> Result<Vec<u8>> {
    let trimmed = line.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body.bytes().filter(|b| !b.is_ascii_whitespace()).collect();

    if digits.len() % 2 != 0 {
        return Err(AppError::InvalidInput(format!(
            "16進文字列の長さが奇数です: {}文字",
            digits.len()
        )));
    }

    digits
        .chunks(2)
        .map(|pair| -> Result<u8> { Ok((hex_value(pair[0])? << 4) | hex_value(pair[1])?) })
        .collect()
}

fn hex_value(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(AppError::InvalidInput(format!(
            "16進数ではない文字が含まれています: {:?}",
            char::from(digit)
        ))),
    }
}

pub fn render(segment: &DecodedTcpSegment, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(serialize(segment)),
        OutputFormat::Json => Ok(serde_json::to_string(segment)?),
    }
}

fn decode_line(line: &str) -> Result<DecodedTcpSegment> {
    let data = parse_hex_line(line)?;
    Ok(decode(&data)?)
}

/// 1行1セグメントで読み込み、デコード結果を書き出す。
/// 不正な行は警告を出して読み飛ばす。
pub async fn process_lines<R, W>(reader: R, writer: &mut W, format: OutputFormat) -> Result<ProcessStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = ProcessStats::default();
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        // 空行とコメント行
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match decode_line(line) {
            Ok(segment) => {
                let rendered = render(&segment, format)?;
                writer.write_all(rendered.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                stats.decoded += 1;
                stats.total_bytes += length_in_bytes(&segment);
                debug!("{}行目: {}バイトのセグメント", line_number, length_in_bytes(&segment));
            }
            Err(e) => {
                warn!("{}行目をスキップしました: {}", line_number, e);
                stats.skipped += 1;
            }
        }
    }

    writer.flush().await?;
    Ok(stats)
}
