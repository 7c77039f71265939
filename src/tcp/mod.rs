pub mod segment;
pub mod tcp_header;

pub use segment::{DecodedTcpSegment, TcpFlags, TCP_MIN_HEADER_SIZE};
pub use tcp_header::{decode, decode_bytes, length_in_bytes, serialize};
