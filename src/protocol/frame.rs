//! Frame codec
//!
//! Every frame is a fixed 14-byte ASCII header followed by a text body:
//!
//! ```text
//! +------+------+---------+----------+--------+---------------------------+
//! | 0x1B | 0x09 | service | body_len | option | body: f0 \f f1 \f f2 ...  |
//! |      |      | 4 digit | 6 digit  | 2 digit|                           |
//! +------+------+---------+----------+--------+---------------------------+
//! ```
//!
//! Fields are separated by form feed (0x0C). Splitting a whole frame on the
//! delimiter puts the header text at index 0, so the first body field sits
//! at index 1. Parsers use that indexing.

use bytes::{BufMut, Bytes, BytesMut};
use std::borrow::Cow;

use super::constants::{
    FIELD_DELIMITER, FRAME_MAGIC, HEADER_SIZE, MAX_BODY_LEN, MAX_OPTION, MAX_SERVICE_CODE,
    SERVICE_CODE_END,
};
use super::service::ServiceCode;
use crate::error::ProtocolError;

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Service code (0..=9999)
    pub service: u16,
    /// Body length in bytes (0..=999999)
    pub body_len: u32,
    /// Option field, always 0 in observed traffic
    pub option: u8,
}

impl FrameHeader {
    /// Create a header with option 0
    pub fn new(service: u16, body_len: u32) -> Self {
        Self {
            service,
            body_len,
            option: 0,
        }
    }

    /// Append the 14 header bytes to `buf`
    ///
    /// Fails without writing anything when a value is wider than its
    /// decimal field.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        if self.service > MAX_SERVICE_CODE {
            return Err(ProtocolError::InvalidHeader(format!(
                "service code {} exceeds {}",
                self.service, MAX_SERVICE_CODE
            )));
        }
        if self.body_len > MAX_BODY_LEN {
            return Err(ProtocolError::BodyTooLarge {
                service: self.service,
                len: self.body_len as usize,
            });
        }
        if self.option > MAX_OPTION {
            return Err(ProtocolError::InvalidHeader(format!(
                "option {} exceeds {}",
                self.option, MAX_OPTION
            )));
        }

        buf.reserve(HEADER_SIZE);
        buf.put_slice(&FRAME_MAGIC);
        buf.put_slice(format!("{:04}", self.service).as_bytes());
        buf.put_slice(format!("{:06}", self.body_len).as_bytes());
        buf.put_slice(format!("{:02}", self.option).as_bytes());
        Ok(())
    }

    /// Decode the header at the start of `data`
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_SIZE {
            return Err(ProtocolError::InvalidHeader(format!(
                "need {} bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        if data[0..2] != FRAME_MAGIC {
            return Err(ProtocolError::InvalidHeader(format!(
                "bad magic {:02X} {:02X}",
                data[0], data[1]
            )));
        }

        let service = parse_decimal(&data[2..6])
            .ok_or_else(|| ProtocolError::InvalidHeader("service code".into()))?;
        let body_len = parse_decimal(&data[6..12])
            .ok_or_else(|| ProtocolError::InvalidHeader("body length".into()))?;
        let option = parse_decimal(&data[12..14])
            .ok_or_else(|| ProtocolError::InvalidHeader("option".into()))?;

        Ok(Self {
            service: service as u16,
            body_len,
            option: option as u8,
        })
    }
}

/// Read the service code from bytes 2..6 of a raw frame
///
/// Returns `None` for frames shorter than 6 bytes or with non-digit code
/// bytes. The magic bytes are not checked here.
pub fn service_code(frame: &[u8]) -> Option<u16> {
    if frame.len() < SERVICE_CODE_END {
        return None;
    }
    parse_decimal(&frame[2..SERVICE_CODE_END]).map(|code| code as u16)
}

/// Build a complete frame (header + body)
///
/// Bodies longer than the length field can express are rejected.
pub fn encode_frame(service: ServiceCode, body: &[u8]) -> Result<Bytes, ProtocolError> {
    let body_len = u32::try_from(body.len())
        .ok()
        .filter(|len| *len <= MAX_BODY_LEN)
        .ok_or(ProtocolError::BodyTooLarge {
            service: service.code(),
            len: body.len(),
        })?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body.len());
    FrameHeader::new(service.code(), body_len).encode(&mut buf)?;
    buf.put_slice(body);
    Ok(buf.freeze())
}

/// Decode a raw frame as text, replacing invalid UTF-8
pub fn frame_text(frame: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(frame)
}

/// Split frame text on the field delimiter
pub fn split_fields(text: &str) -> Vec<&str> {
    text.split(FIELD_DELIMITER as char).collect()
}

fn parse_decimal(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        digits
            .iter()
            .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0')),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(header: FrameHeader) -> BytesMut {
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_header_layout() {
        let buf = encoded(FrameHeader::new(18, 42));
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[..], b"\x1b\x09001800004200");
    }

    #[test]
    fn test_header_round_trip_all_service_codes() {
        let lengths = [0, 1, 9, 10, 99_999, 100_000, 999_999];
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);

        for service in 0..=MAX_SERVICE_CODE {
            for (i, body_len) in lengths.into_iter().enumerate() {
                let header = FrameHeader {
                    service,
                    body_len,
                    option: if i % 2 == 0 { 0 } else { MAX_OPTION },
                };
                buf.clear();
                header.encode(&mut buf).unwrap();
                assert_eq!(buf.len(), HEADER_SIZE);
                assert_eq!(FrameHeader::decode(&buf).unwrap(), header);
            }
        }
    }

    #[test]
    fn test_header_round_trip_all_body_lengths() {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        for body_len in (0..=MAX_BODY_LEN).step_by(997).chain([MAX_BODY_LEN]) {
            let header = FrameHeader::new(121, body_len);
            buf.clear();
            header.encode(&mut buf).unwrap();
            assert_eq!(FrameHeader::decode(&buf).unwrap(), header);
        }
    }

    #[test]
    fn test_header_rejects_oversized_values() {
        let mut buf = BytesMut::new();

        let too_long = FrameHeader::new(5, MAX_BODY_LEN + 1);
        assert_eq!(
            too_long.encode(&mut buf),
            Err(ProtocolError::BodyTooLarge {
                service: 5,
                len: 1_000_000,
            })
        );
        assert!(FrameHeader::new(MAX_SERVICE_CODE + 1, 0).encode(&mut buf).is_err());
        let bad_option = FrameHeader {
            service: 0,
            body_len: 0,
            option: MAX_OPTION + 1,
        };
        assert!(bad_option.encode(&mut buf).is_err());

        // Nothing is written on failure
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_frame_rejects_oversized_body() {
        let body = vec![b'a'; MAX_BODY_LEN as usize + 1];
        assert_eq!(
            encode_frame(ServiceCode::ChatMessage, &body),
            Err(ProtocolError::BodyTooLarge {
                service: 5,
                len: 1_000_000,
            })
        );

        let body = vec![b'a'; MAX_BODY_LEN as usize];
        let frame = encode_frame(ServiceCode::ChatMessage, &body).unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + MAX_BODY_LEN as usize);
        assert_eq!(FrameHeader::decode(&frame).unwrap().body_len, MAX_BODY_LEN);
    }

    #[test]
    fn test_header_too_short() {
        assert!(FrameHeader::decode(b"\x1b\x090005").is_err());
    }

    #[test]
    fn test_header_bad_magic() {
        assert!(FrameHeader::decode(b"XX000500000000").is_err());
    }

    #[test]
    fn test_header_non_digit() {
        assert!(FrameHeader::decode(b"\x1b\x0900a500000000").is_err());
    }

    #[test]
    fn test_service_code_extraction() {
        assert_eq!(service_code(b"\x1b\x090121"), Some(121));
        assert_eq!(service_code(b"\x1b\x09000500001000\x0chi"), Some(5));
    }

    #[test]
    fn test_service_code_short_or_garbage() {
        assert_eq!(service_code(b""), None);
        assert_eq!(service_code(b"\x1b\x09012"), None);
        assert_eq!(service_code(b"\x1b\x09ab12"), None);
    }

    #[test]
    fn test_encode_frame_sets_length() {
        let frame = encode_frame(ServiceCode::Keepalive, b"\x0c").unwrap();
        assert_eq!(&frame[..], b"\x1b\x09000000000100\x0c");
        let header = FrameHeader::decode(&frame).unwrap();
        assert_eq!(header.body_len, 1);
    }

    #[test]
    fn test_split_fields_header_at_index_zero() {
        let frame =
            encode_frame(ServiceCode::SendBalloon, "\x0cmeta\x0cu1\x0cNick\x0c10".as_bytes())
                .unwrap();
        let text = frame_text(&frame);
        let fields = split_fields(&text);
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "\x1b\x09001800001600");
        assert_eq!(&fields[1..], &["meta", "u1", "Nick", "10"]);
    }

    #[test]
    fn test_frame_text_is_lossy() {
        let text = frame_text(&[0x1b, 0x09, 0xff, b'a']);
        assert!(text.ends_with('a'));
    }
}
