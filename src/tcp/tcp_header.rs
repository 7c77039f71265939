// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |          Source Port          |       Destination Port        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Sequence Number                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Acknowledgment Number                      |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Data |           |U|A|P|R|S|F|                               |
// | Offset| Reserved  |R|C|S|S|Y|I|            Window             |
// |       |           |G|K|H|T|N|N|                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |           Checksum            |         Urgent Pointer        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Options                    |    Padding    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
use crate::error::DecodeError;
use crate::tcp::segment::{DecodedTcpSegment, TcpFlags, TCP_MIN_HEADER_SIZE};
use bytes::Bytes;
use log::{debug, trace};

/// TCPヘッダー先頭から始まるバッファをデコードする
pub fn decode(data: &[u8]) -> Result<DecodedTcpSegment, DecodeError> {
    decode_bytes(Bytes::copy_from_slice(data))
}

/// オプションとペイロードは `data` をコピーせずにスライスする
pub fn decode_bytes(data: Bytes) -> Result<DecodedTcpSegment, DecodeError> {
    if data.len() < TCP_MIN_HEADER_SIZE {
        return Err(DecodeError::TruncatedHeader {
            needed: TCP_MIN_HEADER_SIZE,
            available: data.len(),
        });
    }

    let src_port = u16::from_be_bytes([data[0], data[1]]);
    let dst_port = u16::from_be_bytes([data[2], data[3]]);
    let seq_num = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    let ack_num = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    // 下位4ビットは予約領域
    let data_offset = ((data[12] >> 4) & 0xF) * 4;
    let flags = TcpFlags::from_byte(data[13]);
    let window = u16::from_be_bytes([data[14], data[15]]);
    let checksum = u16::from_be_bytes([data[16], data[17]]);
    // 緊急ポインタは読むだけで保持しない
    let _urgent_pointer = u16::from_be_bytes([data[18], data[19]]);

    let header_len = usize::from(data_offset);
    let (options, payload) = if header_len < TCP_MIN_HEADER_SIZE {
        debug!(
            "データオフセットが最小ヘッダー長未満です ({}バイト): オプションとペイロードを空として扱います",
            data_offset
        );
        (Bytes::new(), Bytes::new())
    } else if header_len > data.len() {
        return Err(DecodeError::TruncatedHeader {
            needed: header_len,
            available: data.len(),
        });
    } else {
        (
            data.slice(TCP_MIN_HEADER_SIZE..header_len),
            data.slice(header_len..),
        )
    };

    trace!(
        "TCPセグメントをデコードしました: {} -> {} [{}] オプション{}バイト ペイロード{}バイト",
        src_port,
        dst_port,
        flags.letters(),
        options.len(),
        payload.len()
    );

    Ok(DecodedTcpSegment {
        src_port,
        dst_port,
        seq_num,
        ack_num,
        data_offset,
        flags,
        window,
        checksum,
        options,
        payload,
    })
}

/// セミコロン区切りのログ用文字列
pub fn serialize(segment: &DecodedTcpSegment) -> String {
    segment.to_string()
}

pub fn length_in_bytes(segment: &DecodedTcpSegment) -> usize {
    segment.total_len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::segment::flags;

    fn header(offset_nibble: u8, flags_byte: u8) -> Vec<u8> {
        let mut data = Vec::with_capacity(TCP_MIN_HEADER_SIZE);
        data.extend_from_slice(&1234u16.to_be_bytes());
        data.extend_from_slice(&80u16.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.push(offset_nibble << 4);
        data.push(flags_byte);
        data.extend_from_slice(&8192u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data
    }

    #[test]
    fn test_syn_only_header() {
        let segment = decode(&header(5, flags::SYN)).unwrap();

        assert_eq!(segment.src_port(), 1234);
        assert_eq!(segment.dst_port(), 80);
        assert_eq!(segment.seq_num(), 1);
        assert_eq!(segment.ack_num(), 0);
        assert_eq!(segment.data_offset(), 20);
        assert_eq!(segment.window(), 8192);
        assert_eq!(segment.checksum(), 0);
        assert_eq!(
            segment.flags(),
            TcpFlags { syn: true, ..TcpFlags::default() }
        );
        assert_eq!(segment.options_hex(), "");
        assert_eq!(segment.payload_hex(), "");
        assert_eq!(segment.flag_letters(), "S");
        assert_eq!(serialize(&segment), "1234;80;1;0;20;0;0;0;0;1;0;8192;S");
        assert_eq!(length_in_bytes(&segment), 20);
    }

    #[test]
    fn test_syn_ack_with_payload() {
        let mut data = header(5, flags::SYN | flags::ACK);
        data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let segment = decode(&data).unwrap();

        assert!(segment.flags().syn);
        assert!(segment.flags().ack);
        assert_eq!(segment.flag_letters(), "SA");
        assert_eq!(segment.payload().len(), 4);
        assert_eq!(segment.payload_hex(), "deadbeef");
        assert!(segment.options().is_empty());
        assert_eq!(serialize(&segment), "1234;80;1;0;20;0;1;0;0;1;0;8192;SA");
        assert_eq!(length_in_bytes(&segment), 24);
    }

    #[test]
    fn test_buffer_shorter_than_minimum_header() {
        let data = header(5, flags::SYN);
        assert_eq!(
            decode(&data[..19]),
            Err(DecodeError::TruncatedHeader { needed: 20, available: 19 })
        );
        assert_eq!(
            decode(&[]),
            Err(DecodeError::TruncatedHeader { needed: 20, available: 0 })
        );
    }

    #[test]
    fn test_data_offset_beyond_buffer() {
        let mut data = header(6, flags::ACK);
        data.extend_from_slice(&[0x01, 0x01]);
        assert_eq!(data.len(), 22);
        assert_eq!(
            decode(&data),
            Err(DecodeError::TruncatedHeader { needed: 24, available: 22 })
        );
    }

    #[test]
    fn test_data_offset_below_minimum_yields_empty_options_and_payload() {
        let mut data = header(4, flags::PSH | flags::ACK);
        data.extend_from_slice(b"trailing bytes are ignored");
        let segment = decode(&data).unwrap();

        assert_eq!(segment.data_offset(), 16);
        assert!(segment.options().is_empty());
        assert!(segment.payload().is_empty());
        assert_eq!(length_in_bytes(&segment), 20);
        assert_eq!(serialize(&segment), "1234;80;1;0;16;0;1;1;0;0;0;8192;A");
    }

    #[test]
    fn test_zero_data_offset_is_not_an_error() {
        let segment = decode(&header(0, 0)).unwrap();
        assert_eq!(segment.data_offset(), 0);
        assert!(segment.options().is_empty());
        assert!(segment.payload().is_empty());
    }

    #[test]
    fn test_options_and_payload_slicing() {
        let mut data = header(7, flags::ACK);
        // MSS + NOP + NOP + SACK permitted
        data.extend_from_slice(&[0x02, 0x04, 0x05, 0xb4, 0x01, 0x01, 0x04, 0x02]);
        data.extend_from_slice(b"GET / HTTP/1.1\r\n");
        let segment = decode(&data).unwrap();

        assert_eq!(segment.data_offset(), 28);
        assert_eq!(segment.options().len(), usize::from(segment.data_offset()) - 20);
        assert_eq!(segment.options_hex(), "020405b401010402");
        assert_eq!(segment.payload().len(), data.len() - 28);
        assert_eq!(&segment.payload()[..], b"GET / HTTP/1.1\r\n");
        assert_eq!(length_in_bytes(&segment), data.len());
    }

    #[test]
    fn test_maximum_data_offset() {
        let mut data = header(15, 0);
        data.extend(std::iter::repeat(0x01).take(40));
        let segment = decode(&data).unwrap();
        assert_eq!(segment.data_offset(), 60);
        assert_eq!(segment.options().len(), 40);
        assert!(segment.payload().is_empty());
    }

    #[test]
    fn test_reserved_bits_do_not_affect_offset() {
        let mut data = header(5, flags::FIN);
        data[12] |= 0x0F;
        let segment = decode(&data).unwrap();
        assert_eq!(segment.data_offset(), 20);
        assert!(segment.flags().fin);
    }

    #[test]
    fn test_each_flag_bit_is_independent() {
        let base = decode(&header(5, 0)).unwrap().flags();
        assert_eq!(base, TcpFlags::default());

        let cases: [(u8, fn(&TcpFlags) -> bool); 6] = [
            (flags::URG, |f| f.urg),
            (flags::ACK, |f| f.ack),
            (flags::PSH, |f| f.psh),
            (flags::RST, |f| f.rst),
            (flags::SYN, |f| f.syn),
            (flags::FIN, |f| f.fin),
        ];
        for (bit, get) in cases {
            let toggled = decode(&header(5, bit)).unwrap().flags();
            assert!(get(&toggled), "ビット {:#04x} が反映されていません", bit);
            assert_eq!(toggled.to_byte(), bit);
        }
    }

    #[test]
    fn test_any_flag_combination_is_accepted() {
        let segment = decode(&header(5, flags::SYN | flags::FIN | flags::RST)).unwrap();
        assert_eq!(segment.flag_letters(), "SRF");
        assert_eq!(segment.flags_byte(), 0x07);
    }

    #[test]
    fn test_unvalidated_checksum_is_kept() {
        let mut data = header(5, flags::ACK);
        data[16] = 0xab;
        data[17] = 0xcd;
        assert_eq!(decode(&data).unwrap().checksum(), 0xabcd);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let data = header(5, 0x3f);
        let first = serialize(&decode(&data).unwrap());
        let second = serialize(&decode(&data).unwrap());
        assert_eq!(first, second);
        assert_eq!(first, "1234;80;1;0;20;1;1;1;1;1;1;8192;SARFU");
    }

    #[test]
    fn test_decode_bytes_shares_buffer() {
        let mut data = header(5, flags::ACK);
        data.extend_from_slice(b"payload");
        let buffer = Bytes::from(data);
        let segment = decode_bytes(buffer.clone()).unwrap();
        assert_eq!(segment.payload(), &buffer.slice(20..));
    }
}
