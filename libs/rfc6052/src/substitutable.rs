use std::net::Ipv6Addr;

/// Returns `true` if `addr` is substitutable: not unspecified, not loopback,
/// not multicast. Rust's [`Ipv6Addr`] carries no scope id of its own (that
/// only exists on [`std::net::SocketAddrV6`] or in textual `addr%zone`
/// notation), so callers that accept addresses from text must reject a
/// scope id before they ever construct the [`Ipv6Addr`] passed in here.
#[must_use]
pub fn is_substitutable_ipv6(addr: Ipv6Addr) -> bool {
    !addr.is_unspecified() && !addr.is_loopback() && !addr.is_multicast()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unspecified() {
        assert!(!is_substitutable_ipv6(Ipv6Addr::UNSPECIFIED));
    }

    #[test]
    fn rejects_loopback() {
        assert!(!is_substitutable_ipv6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn rejects_multicast() {
        assert!(!is_substitutable_ipv6("ff02::1".parse().unwrap()));
    }

    #[test]
    fn accepts_ordinary_address() {
        assert!(is_substitutable_ipv6("2001:db8::1".parse().unwrap()));
    }
}
