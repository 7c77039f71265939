use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::fmt::{self, Write};

/// オプションを含まない固定部分のTCPヘッダー長
pub const TCP_MIN_HEADER_SIZE: usize = 20;

/// フラグバイトの各ビット
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TcpFlags {
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TcpFlags {
    /// 上位2ビット(ECN/CWR)は無視する
    pub fn from_byte(byte: u8) -> Self {
        Self {
            urg: byte & flags::URG != 0,
            ack: byte & flags::ACK != 0,
            psh: byte & flags::PSH != 0,
            rst: byte & flags::RST != 0,
            syn: byte & flags::SYN != 0,
            fin: byte & flags::FIN != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        [
            (self.urg, flags::URG),
            (self.ack, flags::ACK),
            (self.psh, flags::PSH),
            (self.rst, flags::RST),
            (self.syn, flags::SYN),
            (self.fin, flags::FIN),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, bit)| acc | bit)
    }

    /// S, A, R, F, U の順で立っているフラグの文字を並べる。PSHは含まない。
    pub fn letters(self) -> String {
        let mut letters = String::new();
        if self.syn {
            letters.push('S');
        }
        if self.ack {
            letters.push('A');
        }
        if self.rst {
            letters.push('R');
        }
        if self.fin {
            letters.push('F');
        }
        if self.urg {
            letters.push('U');
        }
        letters
    }
}

/// デコード済みのTCPセグメント。構築後は変更できない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTcpSegment {
    pub(crate) src_port: u16,
    pub(crate) dst_port: u16,
    pub(crate) seq_num: u32,
    pub(crate) ack_num: u32,
    pub(crate) data_offset: u8,
    #[serde(flatten)]
    pub(crate) flags: TcpFlags,
    pub(crate) window: u16,
    pub(crate) checksum: u16,
    #[serde(serialize_with = "serialize_hex")]
    pub(crate) options: Bytes,
    #[serde(serialize_with = "serialize_hex")]
    pub(crate) payload: Bytes,
}

impl DecodedTcpSegment {
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn seq_num(&self) -> u32 {
        self.seq_num
    }

    pub fn ack_num(&self) -> u32 {
        self.ack_num
    }

    /// ヘッダー長(バイト)。20未満の不正な値もそのまま報告する。
    pub fn data_offset(&self) -> u8 {
        self.data_offset
    }

    pub fn flags(&self) -> TcpFlags {
        self.flags
    }

    pub fn flags_byte(&self) -> u8 {
        self.flags.to_byte()
    }

    pub fn flag_letters(&self) -> String {
        self.flags.letters()
    }

    pub fn window(&self) -> u16 {
        self.window
    }

    /// 検証はしていない
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn options(&self) -> &Bytes {
        &self.options
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn options_hex(&self) -> String {
        to_hex(&self.options)
    }

    pub fn payload_hex(&self) -> String {
        to_hex(&self.payload)
    }

    pub fn header_len(&self) -> usize {
        usize::from(self.data_offset).max(TCP_MIN_HEADER_SIZE)
    }

    /// ヘッダー長 + ペイロードの実バイト数
    pub fn total_len(&self) -> usize {
        self.header_len() + self.payload.len()
    }
}

// src;dst;seq;ack;data_offset;urg;ack;psh;rst;syn;fin;window;flag_letters
impl fmt::Display for DecodedTcpSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |set: bool| if set { 1 } else { 0 };
        write!(
            f,
            "{};{};{};{};{};{};{};{};{};{};{};{};{}",
            self.src_port,
            self.dst_port,
            self.seq_num,
            self.ack_num,
            self.data_offset,
            bit(self.flags.urg),
            bit(self.flags.ack),
            bit(self.flags.psh),
            bit(self.flags.rst),
            bit(self.flags.syn),
            bit(self.flags.fin),
            self.window,
            self.flags.letters(),
        )
    }
}

pub(crate) fn to_hex(data: &[u8]) -> String {
    let mut hex = String::with_capacity(data.len() * 2);
    for byte in data {
        // Stringへの書き込みは失敗しない
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

fn serialize_hex<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(data))
}
