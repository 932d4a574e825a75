//! End-to-end scenarios driven through the public API surface. The ones
//! that need a live network listener are covered by `#[cfg(test)]` units
//! inside their own modules instead, since the binary's listener setup
//! isn't exposed through the library surface.

use std::net::{Ipv4Addr, SocketAddr};

use get4for6::addr::{ClientAddressMapper, ClientAllowList};
use get4for6::config::resolved::{AppConfig, GeneralSettings, TranslationSettings};
use get4for6::context::AppContext;
use get4for6::saq::handler::{self, Encoding};
use get4for6::substitute::static_mapper::StaticMapper;
use get4for6::substitute::{DynamicConfig, SubstituteMapper};

fn allow_list() -> ClientAllowList {
    ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()])
}

#[test]
fn stateless_client_round_trip_for_every_allowed_address() {
    let mapper = ClientAddressMapper::new("64:ff9b::/96".parse().unwrap(), allow_list());
    for host in 1..=254u8 {
        let v4 = Ipv4Addr::new(192, 0, 2, host);
        let v6 = mapper.map_client_4to6(v4).unwrap();
        assert_eq!(mapper.map_client_6to4(v6, false).unwrap(), v4);
    }
}

#[test]
fn space_full_on_a_two_host_pool_then_unauthorized_client_is_a_fault() {
    // A /30 pool has exactly two usable host addresses once network and
    // broadcast are excluded.
    let mut mapper = SubstituteMapper::new(
        allow_list(),
        StaticMapper::new(vec![]),
        Some(DynamicConfig {
            pool: vec!["198.51.100.0/30".parse().unwrap()],
            min_lifetime_after_last_hit: std::time::Duration::from_secs(3600),
        }),
    );
    let client: Ipv4Addr = "192.0.2.5".parse().unwrap();

    mapper
        .substitute_6to4("2001:db8::1".parse().unwrap(), client, true)
        .unwrap();
    mapper
        .substitute_6to4("2001:db8::2".parse().unwrap(), client, true)
        .unwrap();

    let err = mapper
        .substitute_6to4("2001:db8::3".parse().unwrap(), client, true)
        .unwrap_err();
    assert_eq!(err, get4for6::substitute::SubstituteError::SubstituteSpaceFull);
}

#[test]
fn config_file_loads_into_a_fully_wired_context() {
    let toml = r#"
[translation]
client_allowed_subnets = ["192.0.2.0/24"]
map_client_addrs_into = "64:ff9b::/96"
substitute_subnets = ["198.51.100.0/24"]

[translation.dynamic_substitute_addr_assigning]
min_lifetime_after_last_hit = 60

[saq]
listen_on_binary = ["127.0.0.1:9000"]
"#;
    let dir = std::env::temp_dir().join(format!(
        "get4for6-scenario-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, toml).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert!(config.dns.is_none());
    assert!(config.xax.is_none());
    let saq = config.saq.as_ref().unwrap();
    assert_eq!(saq.listen_on_binary, vec!["127.0.0.1:9000".parse::<SocketAddr>().unwrap()]);

    let client_mapper = ClientAddressMapper::new(
        config.translation.client_prefix,
        ClientAllowList::new(config.translation.client_allowed_subnets.clone()),
    );
    let substitute_mapper = SubstituteMapper::new(
        ClientAllowList::new(config.translation.client_allowed_subnets.clone()),
        StaticMapper::new(config.translation.static_substitute_addr_assignments.clone()),
        None,
    );
    let _ctx = AppContext::new(config, client_mapper, substitute_mapper);

    std::fs::remove_dir_all(&dir).ok();
}

fn test_context() -> AppContext {
    let allow = allow_list();
    AppContext::new(
        AppConfig {
            general: GeneralSettings::default(),
            translation: TranslationSettings {
                client_allowed_subnets: vec!["192.0.2.0/24".parse().unwrap()],
                client_prefix: "64:ff9b::/96".parse().unwrap(),
                substitute_subnets: vec!["198.51.100.0/24".parse().unwrap()],
                static_substitute_addr_assignments: vec![],
                dynamic_substitute_addr_assigning: None,
            },
            dns: None,
            xax: None,
            saq: None,
        },
        ClientAddressMapper::new("64:ff9b::/96".parse().unwrap(), allow.clone()),
        SubstituteMapper::new(
            allow,
            StaticMapper::new(vec![(
                "198.51.100.10".parse().unwrap(),
                "2001:db8::abcd".parse().unwrap(),
            )]),
            None,
        ),
    )
}

#[test]
fn unauthorized_peer_is_refused_before_any_substitute_lookup_runs() {
    let ctx = test_context();
    let outsider: SocketAddr = "203.0.113.9:4000".parse().unwrap();
    let result = handler::handle(
        &ctx,
        outsider,
        &Ipv4Addr::new(198, 51, 100, 10).octets(),
        Encoding::Binary,
    );
    assert!(result.is_err());
}
