//! Simple-address-query errors; all are silent-drop conditions upstream.

#[derive(Debug, thiserror::Error)]
pub enum SaqError {
    #[error("datagram is neither 4 nor 16 octets, and isn't a valid IP literal")]
    UnrecognizedEncoding,
    #[error("peer {0} is not an authorized client")]
    PeerNotAllowed(std::net::Ipv4Addr),
    #[error("query arrived over something other than IPv4")]
    NonV4Peer,
}
