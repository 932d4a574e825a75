//! The print-map task: on signal, dumps every current assignment to the
//! log stream.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::Facility;
use crate::context::AppContext;
use crate::debug_for;
use crate::substitute::SubstituteMapper;

/// Runs until shutdown, dumping the assignment map each time a print-map
/// signal arrives.
pub async fn run(ctx: Arc<AppContext>) {
    loop {
        tokio::select! {
            () = ctx.shutdown_requested() => return,
            () = ctx.print_map_requested() => {
                let dump = {
                    let mapper = ctx.substitute_mapper.lock().expect("mapper mutex poisoned");
                    format_print_map(&mapper)
                };
                debug_for!(Facility::PrintMap, "dumping assignment map");
                log::info!("\n{dump}");
            }
        }
    }
}

fn format_print_map(mapper: &SubstituteMapper) -> String {
    let mut out = String::new();
    writeln!(out, "--- Static mappings ---").unwrap();
    for (v4, v6) in mapper.static_mapper().iter() {
        writeln!(out, "{v4} <-> {v6}").unwrap();
    }

    for (client_v4, dynamic) in mapper.dynamic_mappers() {
        writeln!(out).unwrap();
        writeln!(out, "--- Dynamic mappings for {client_v4} ---").unwrap();
        for assignment in dynamic.iter_assignments() {
            match dynamic.remaining_guaranteed_lifetime(assignment.last_hit_at) {
                Some(remaining) => writeln!(
                    out,
                    "{} <-> {} ... remaining guaranteed lifetime: {} seconds",
                    assignment.v4, assignment.v6, remaining
                )
                .unwrap(),
                None => writeln!(
                    out,
                    "{} <-> {} ... may be replaced",
                    assignment.v4, assignment.v6
                )
                .unwrap(),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::ClientAllowList;
    use crate::substitute::static_mapper::StaticMapper;
    use std::time::Duration;

    #[test]
    fn formats_static_and_dynamic_sections() {
        let mut mapper = SubstituteMapper::new(
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
            StaticMapper::new(vec![(
                "198.51.100.10".parse().unwrap(),
                "2001:db8::abcd".parse().unwrap(),
            )]),
            Some(crate::substitute::DynamicConfig {
                pool: vec!["198.51.100.0/24".parse().unwrap()],
                min_lifetime_after_last_hit: Duration::from_secs(60),
            }),
        );
        mapper
            .substitute_6to4(
                "2001:db8::1".parse().unwrap(),
                "192.0.2.5".parse().unwrap(),
                true,
            )
            .unwrap();

        let dump = format_print_map(&mapper);
        assert!(dump.contains("--- Static mappings ---"));
        assert!(dump.contains("198.51.100.10 <-> 2001:db8::abcd"));
        assert!(dump.contains("--- Dynamic mappings for 192.0.2.5 ---"));
        assert!(dump.contains("remaining guaranteed lifetime"));
    }
}
