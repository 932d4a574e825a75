//! The fixed-size binary frame spoken by the XAX surface.
//!
//! The wire format itself is owned by an external library the original
//! deployment links against; nothing in this pack shows its byte layout.
//! The layout below is this implementation's own choice, picked to satisfy
//! the same constraints (fixed size, one message type tag, two embedded
//! addresses, a cache-lifetime hint on success): a one-byte tag, two
//! 16-byte address slots (IPv4 addresses occupy the last four bytes of a
//! slot, the rest zeroed), and, on the response, a one-byte status and
//! cache-lifetime trailer.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::error::XaxError;

pub const REQUEST_LEN: usize = 33;
pub const RESPONSE_LEN: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Forward4to6Main,
    Forward4to6IcmpError,
    Forward6to4Main,
    Forward6to4IcmpError,
}

impl MessageType {
    fn from_tag(tag: u8) -> Result<Self, XaxError> {
        match tag {
            0 => Ok(Self::Forward4to6Main),
            1 => Ok(Self::Forward4to6IcmpError),
            2 => Ok(Self::Forward6to4Main),
            3 => Ok(Self::Forward6to4IcmpError),
            other => Err(XaxError::UnknownMessageType(other)),
        }
    }

    fn tag(self) -> u8 {
        match self {
            Self::Forward4to6Main => 0,
            Self::Forward4to6IcmpError => 1,
            Self::Forward6to4Main => 2,
            Self::Forward6to4IcmpError => 3,
        }
    }

    /// `true` for the two 4→6 types, whose embedded addresses are IPv4.
    #[must_use]
    pub fn is_4to6(self) -> bool {
        matches!(self, Self::Forward4to6Main | Self::Forward4to6IcmpError)
    }

    /// `true` for the two "main packet" types, as opposed to icmp-error.
    #[must_use]
    pub fn is_main(self) -> bool {
        matches!(self, Self::Forward4to6Main | Self::Forward6to4Main)
    }
}

/// A request's source/destination pair, typed by the request's own
/// direction so callers can't mix up which half is v4 and which is v6.
#[derive(Debug, Clone, Copy)]
pub enum AddrPair {
    V4 { source: Ipv4Addr, destination: Ipv4Addr },
    V6 { source: Ipv6Addr, destination: Ipv6Addr },
}

#[derive(Debug, Clone, Copy)]
pub struct XaxRequest {
    pub message_type: MessageType,
    pub addrs: AddrPair,
}

impl XaxRequest {
    pub fn decode(buf: &[u8]) -> Result<Self, XaxError> {
        if buf.len() != REQUEST_LEN {
            return Err(XaxError::WrongFrameLength {
                expected: REQUEST_LEN,
                got: buf.len(),
            });
        }
        let message_type = MessageType::from_tag(buf[0])?;
        let source_slot = &buf[1..17];
        let destination_slot = &buf[17..33];
        let addrs = if message_type.is_4to6() {
            AddrPair::V4 {
                source: unpack_v4(source_slot),
                destination: unpack_v4(destination_slot),
            }
        } else {
            AddrPair::V6 {
                source: unpack_v6(source_slot),
                destination: unpack_v6(destination_slot),
            }
        };
        Ok(Self { message_type, addrs })
    }
}

/// Either half of a successful response: the concrete address type follows
/// from which side of the translation produced it, not from the request's
/// own direction (4→6 main translates its destination into a v6; 6→4 main
/// translates its destination into a v4).
#[derive(Debug, Clone, Copy)]
pub enum Slot {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl Slot {
    fn pack(self) -> [u8; 16] {
        match self {
            Self::V4(addr) => pack_v4(addr),
            Self::V6(addr) => pack_v6(addr),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum XaxResponse {
    Success {
        new_source: Slot,
        new_destination: Slot,
        cache_lifetime: u8,
    },
    Error {
        icmp: bool,
    },
}

impl XaxResponse {
    #[must_use]
    pub fn encode(self) -> [u8; RESPONSE_LEN] {
        let mut out = [0u8; RESPONSE_LEN];
        match self {
            Self::Success {
                new_source,
                new_destination,
                cache_lifetime,
            } => {
                out[0] = 0;
                out[1..17].copy_from_slice(&new_source.pack());
                out[17..33].copy_from_slice(&new_destination.pack());
                out[33] = cache_lifetime;
            }
            Self::Error { icmp } => {
                out[0] = 1;
                out[1] = u8::from(icmp);
            }
        }
        out
    }
}

fn pack_v4(addr: Ipv4Addr) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[12..16].copy_from_slice(&addr.octets());
    buf
}

fn pack_v6(addr: Ipv6Addr) -> [u8; 16] {
    addr.octets()
}

fn unpack_v4(buf: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15])
}

fn unpack_v6(buf: &[u8]) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(buf);
    Ipv6Addr::from(octets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_4to6_main_request() {
        let mut buf = [0u8; REQUEST_LEN];
        buf[0] = 0;
        buf[13..17].copy_from_slice(&[192, 0, 2, 1]);
        buf[29..33].copy_from_slice(&[203, 0, 113, 9]);
        let req = XaxRequest::decode(&buf).unwrap();
        assert_eq!(req.message_type, MessageType::Forward4to6Main);
        match req.addrs {
            AddrPair::V4 { source, destination } => {
                assert_eq!(source, Ipv4Addr::new(192, 0, 2, 1));
                assert_eq!(destination, Ipv4Addr::new(203, 0, 113, 9));
            }
            AddrPair::V6 { .. } => panic!("expected v4 pair"),
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let buf = [0u8; REQUEST_LEN - 1];
        assert!(matches!(
            XaxRequest::decode(&buf),
            Err(XaxError::WrongFrameLength { .. })
        ));
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut buf = [0u8; REQUEST_LEN];
        buf[0] = 9;
        assert!(matches!(
            XaxRequest::decode(&buf),
            Err(XaxError::UnknownMessageType(9))
        ));
    }

    #[test]
    fn encodes_success_response() {
        let resp = XaxResponse::Success {
            new_source: Slot::V6("2001:db8::1".parse().unwrap()),
            new_destination: Slot::V4(Ipv4Addr::new(198, 51, 100, 1)),
            cache_lifetime: 7,
        };
        let buf = resp.encode();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[33], 7);
        assert_eq!(&buf[29..33], &[198, 51, 100, 1]);
    }

    #[test]
    fn encodes_error_response() {
        let buf = XaxResponse::Error { icmp: true }.encode();
        assert_eq!(buf[0], 1);
        assert_eq!(buf[1], 1);
    }
}
