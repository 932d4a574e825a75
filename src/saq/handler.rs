//! One-shot translation of a single datagram.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::context::AppContext;

use super::error::SaqError;

#[derive(Debug, Clone, Copy)]
pub enum Encoding {
    Binary,
    Plaintext,
}

/// Parses, authorizes, and translates `datagram`, returning the encoded
/// response body, or `Err` when the datagram should be silently dropped.
pub fn handle(
    ctx: &AppContext,
    peer: SocketAddr,
    datagram: &[u8],
    encoding: Encoding,
) -> Result<Vec<u8>, SaqError> {
    let peer_v4 = match peer.ip() {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(_) => return Err(SaqError::NonV4Peer),
    };
    if !ctx.client_mapper.allow_list().contains(peer_v4) {
        return Err(SaqError::PeerNotAllowed(peer_v4));
    }

    let addr = decode(datagram, encoding)?;
    let mut mapper = ctx.substitute_mapper.lock().expect("mapper mutex poisoned");
    match addr {
        IpAddr::V4(v4) => {
            let (v6, _ttl) = mapper
                .substitute_4to6(v4, peer_v4)
                .map_err(|_| SaqError::UnrecognizedEncoding)?;
            Ok(encode(IpAddr::V6(v6), encoding))
        }
        IpAddr::V6(v6) => {
            let (v4, _ttl) = mapper
                .substitute_6to4(v6, peer_v4, true)
                .map_err(|_| SaqError::UnrecognizedEncoding)?;
            Ok(encode(IpAddr::V4(v4), encoding))
        }
    }
}

fn decode(datagram: &[u8], encoding: Encoding) -> Result<IpAddr, SaqError> {
    match encoding {
        Encoding::Binary => match datagram.len() {
            4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(datagram);
                Ok(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(datagram);
                Ok(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            _ => Err(SaqError::UnrecognizedEncoding),
        },
        Encoding::Plaintext => {
            let text = std::str::from_utf8(datagram).map_err(|_| SaqError::UnrecognizedEncoding)?;
            text.trim()
                .parse::<IpAddr>()
                .map_err(|_| SaqError::UnrecognizedEncoding)
        }
    }
}

fn encode(addr: IpAddr, encoding: Encoding) -> Vec<u8> {
    match (encoding, addr) {
        (Encoding::Binary, IpAddr::V4(v4)) => v4.octets().to_vec(),
        (Encoding::Binary, IpAddr::V6(v6)) => v6.octets().to_vec(),
        (Encoding::Plaintext, addr) => addr.to_string().into_bytes(),
    }
}
