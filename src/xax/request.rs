//! Applies the four translation rules to a decoded request.

use crate::addr::{ClientAddressError, ClientAddressMapper};
use crate::substitute::{SubstituteError, SubstituteMapper};

use super::frame::{AddrPair, MessageType, Slot, XaxRequest, XaxResponse};

/// Either half of a translation failing; only used to decide the response's
/// ICMP bit, never surfaced to the caller as an error value.
enum Failure {
    Client(ClientAddressError),
    Substitute(SubstituteError),
}

impl Failure {
    fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::Substitute(SubstituteError::AssignmentNotFound | SubstituteError::SubstituteSpaceFull)
        )
    }
}

impl From<ClientAddressError> for Failure {
    fn from(e: ClientAddressError) -> Self {
        Self::Client(e)
    }
}

impl From<SubstituteError> for Failure {
    fn from(e: SubstituteError) -> Self {
        Self::Substitute(e)
    }
}

/// Translates one request, locking `substitute_mapper` only for the single
/// lookup/allocation each rule needs.
pub fn translate(
    client_mapper: &ClientAddressMapper,
    substitute_mapper: &std::sync::Mutex<SubstituteMapper>,
    request: &XaxRequest,
) -> XaxResponse {
    let result = match (request.message_type, request.addrs) {
        (MessageType::Forward4to6Main, AddrPair::V4 { source, destination }) => {
            apply_4to6_main(client_mapper, substitute_mapper, source, destination)
        }
        (MessageType::Forward4to6IcmpError, AddrPair::V4 { source, destination }) => {
            apply_4to6_icmp_error(client_mapper, substitute_mapper, source, destination)
        }
        (MessageType::Forward6to4Main, AddrPair::V6 { source, destination }) => {
            apply_6to4_main(client_mapper, substitute_mapper, source, destination)
        }
        (MessageType::Forward6to4IcmpError, AddrPair::V6 { source, destination }) => {
            apply_6to4_icmp_error(client_mapper, substitute_mapper, source, destination)
        }
        _ => unreachable!("XaxRequest::decode pairs message_type with the matching AddrPair variant"),
    };

    match result {
        Ok((new_source, new_destination, cache_lifetime)) => XaxResponse::Success {
            new_source,
            new_destination,
            cache_lifetime,
        },
        Err(failure) => XaxResponse::Error {
            icmp: failure.is_resource_error() && request.message_type.is_main(),
        },
    }
}

type Translated = (Slot, Slot, u8);

fn apply_4to6_main(
    client_mapper: &ClientAddressMapper,
    substitute_mapper: &std::sync::Mutex<SubstituteMapper>,
    old_src: std::net::Ipv4Addr,
    old_dst: std::net::Ipv4Addr,
) -> Result<Translated, Failure> {
    let new_source = client_mapper.map_client_4to6(old_src)?;
    let (new_destination, ttl) = substitute_mapper.lock().expect("mapper mutex poisoned").substitute_4to6(old_dst, old_src)?;
    Ok((Slot::V6(new_source), Slot::V6(new_destination), cache_lifetime_byte(ttl)))
}

fn apply_4to6_icmp_error(
    client_mapper: &ClientAddressMapper,
    substitute_mapper: &std::sync::Mutex<SubstituteMapper>,
    old_src: std::net::Ipv4Addr,
    old_dst: std::net::Ipv4Addr,
) -> Result<Translated, Failure> {
    let new_destination = client_mapper.map_client_4to6(old_dst)?;
    let (new_source, ttl) = substitute_mapper.lock().expect("mapper mutex poisoned").substitute_4to6(old_src, old_dst)?;
    Ok((Slot::V6(new_source), Slot::V6(new_destination), cache_lifetime_byte(ttl)))
}

fn apply_6to4_main(
    client_mapper: &ClientAddressMapper,
    substitute_mapper: &std::sync::Mutex<SubstituteMapper>,
    old_src: std::net::Ipv6Addr,
    old_dst: std::net::Ipv6Addr,
) -> Result<Translated, Failure> {
    let new_destination = client_mapper.map_client_6to4(old_dst, false)?;
    let (new_source, ttl) = substitute_mapper
        .lock()
        .expect("mapper mutex poisoned")
        .substitute_6to4(old_src, new_destination, true)?;
    Ok((Slot::V4(new_source), Slot::V4(new_destination), cache_lifetime_byte(ttl)))
}

fn apply_6to4_icmp_error(
    client_mapper: &ClientAddressMapper,
    substitute_mapper: &std::sync::Mutex<SubstituteMapper>,
    old_src: std::net::Ipv6Addr,
    old_dst: std::net::Ipv6Addr,
) -> Result<Translated, Failure> {
    let new_source = client_mapper.map_client_6to4(old_src, false)?;
    let (new_destination, ttl) = substitute_mapper
        .lock()
        .expect("mapper mutex poisoned")
        .substitute_6to4(old_dst, new_source, true)?;
    Ok((Slot::V4(new_source), Slot::V4(new_destination), cache_lifetime_byte(ttl)))
}

fn cache_lifetime_byte(ttl: u64) -> u8 {
    u8::try_from(ttl).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::ClientAllowList;
    use crate::substitute::static_mapper::StaticMapper;
    use crate::substitute::DynamicConfig;
    use std::sync::Mutex;
    use std::time::Duration;

    fn client_mapper() -> ClientAddressMapper {
        ClientAddressMapper::new(
            "64:ff9b::/96".parse().unwrap(),
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
        )
    }

    fn substitute_mapper() -> Mutex<SubstituteMapper> {
        Mutex::new(SubstituteMapper::new(
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
            StaticMapper::new(vec![]),
            Some(DynamicConfig {
                pool: vec!["198.51.100.0/24".parse().unwrap()],
                min_lifetime_after_last_hit: Duration::from_secs(60),
            }),
        ))
    }

    #[test]
    fn translates_4to6_main_request() {
        let req = XaxRequest::decode(&{
            let mut buf = [0u8; super::super::frame::REQUEST_LEN];
            buf[0] = 0;
            buf[13..17].copy_from_slice(&[192, 0, 2, 5]);
            buf[29..33].copy_from_slice(&[93, 184, 216, 34]);
            buf
        })
        .unwrap();

        let resp = translate(&client_mapper(), &substitute_mapper(), &req);
        match resp {
            XaxResponse::Success { new_source, new_destination, .. } => {
                assert!(matches!(new_source, Slot::V6(_)));
                assert!(matches!(new_destination, Slot::V6(_)));
            }
            XaxResponse::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn unauthorized_client_yields_non_icmp_error() {
        let req = XaxRequest::decode(&{
            let mut buf = [0u8; super::super::frame::REQUEST_LEN];
            buf[0] = 0;
            buf[13..17].copy_from_slice(&[203, 0, 113, 5]);
            buf[29..33].copy_from_slice(&[93, 184, 216, 34]);
            buf
        })
        .unwrap();

        let resp = translate(&client_mapper(), &substitute_mapper(), &req);
        assert!(matches!(resp, XaxResponse::Error { icmp: false }));
    }

    #[test]
    fn icmp_error_type_never_sets_icmp_bit() {
        // No static table and no dynamic config: any substitute lookup is a
        // resource error (AssignmentNotFound). On a main request that would
        // set the ICMP bit; on an icmp-error request it must not.
        let subs = Mutex::new(SubstituteMapper::new(
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
            StaticMapper::new(vec![]),
            None,
        ));
        let req = XaxRequest::decode(&{
            let mut buf = [0u8; super::super::frame::REQUEST_LEN];
            buf[0] = 1; // 4to6 icmp-error
            buf[13..17].copy_from_slice(&[192, 0, 2, 5]);
            buf[29..33].copy_from_slice(&[192, 0, 2, 9]);
            buf
        })
        .unwrap();
        let resp = translate(&client_mapper(), &subs, &req);
        assert!(matches!(resp, XaxResponse::Error { icmp: false }));
    }
}
