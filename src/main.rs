#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use clap::Parser;

use get4for6::addr::{ClientAddressMapper, ClientAllowList};
use get4for6::cli::Args;
use get4for6::config::resolved::AppConfig;
use get4for6::context::AppContext;
use get4for6::logging::enable_logger;
use get4for6::substitute::{static_mapper::StaticMapper, DynamicConfig, SubstituteMapper};
use get4for6::{dns, printmap, saq, signals, xax, AppError};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = run(args).await {
        eprintln!("! ERROR: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = AppConfig::load(&args.config_file)?;
    enable_logger(args.verbose, config.general.debug_facilities.clone());

    let allow_list = ClientAllowList::new(config.translation.client_allowed_subnets.clone());
    let client_mapper = ClientAddressMapper::new(config.translation.client_prefix, allow_list.clone());

    let static_mapper = StaticMapper::new(config.translation.static_substitute_addr_assignments.clone());
    let dynamic_config = config
        .translation
        .dynamic_substitute_addr_assigning
        .as_ref()
        .map(|settings| DynamicConfig {
            pool: config.translation.substitute_subnets.clone(),
            min_lifetime_after_last_hit: settings.min_lifetime_after_last_hit,
        });
    let substitute_mapper = SubstituteMapper::new(allow_list, static_mapper, dynamic_config);

    let dns_settings = config.dns.clone();
    let xax_settings = config.xax.clone();
    let saq_settings = config.saq.clone();

    let ctx = Arc::new(AppContext::new(config, client_mapper, substitute_mapper));

    let mut tasks = Vec::new();
    tasks.push(signals::spawn(ctx.clone()));
    tasks.push(tokio::spawn(printmap::run(ctx.clone())));

    if let Some(settings) = dns_settings {
        tasks.extend(dns::spawn(ctx.clone(), Arc::new(settings)));
    }
    if let Some(settings) = xax_settings {
        tasks.extend(xax::spawn(ctx.clone(), &settings));
    }
    if let Some(settings) = saq_settings {
        tasks.extend(saq::spawn(ctx.clone(), &settings).await);
    }

    log::info!("get4for6 is running");

    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}
