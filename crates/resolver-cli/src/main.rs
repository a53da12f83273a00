//! Command line driver for the resource resolver

mod commands;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use resolver_core::{ResolveRequest, ResolverConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn fixtures_arg() -> Arg {
    Arg::new("fixtures")
        .long("fixtures")
        .value_parser(value_parser!(PathBuf))
        .help("JSON file of entity descriptions to answer lookups from")
}

fn cli() -> Command {
    Command::new("resource-resolver")
        .version(resolver_core::VERSION)
        .about("Resolve entity identifiers into audited union views")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve one request and print the view")
                .arg(
                    Arg::new("iri")
                        .long("iri")
                        .help("Identifier of the entity to describe"),
                )
                .arg(
                    Arg::new("user-agent")
                        .long("user-agent")
                        .help("Client descriptor recorded in the audit log"),
                )
                .arg(
                    Arg::new("request-uri")
                        .long("request-uri")
                        .default_value(commands::DEFAULT_REQUEST_URI)
                        .help("Root node of the response"),
                )
                .arg(fixtures_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("stress")
                .about("Run concurrent resolutions and check the audit count")
                .arg(
                    Arg::new("iri")
                        .long("iri")
                        .required(true)
                        .help("Identifier resolved by every request"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .default_value("100")
                        .value_parser(value_parser!(usize))
                        .help("Number of concurrent requests"),
                )
                .arg(fixtures_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("log")
                .about("Resolve the given identifiers and dump the audit log")
                .arg(
                    Arg::new("iri")
                        .long("iri")
                        .action(ArgAction::Append)
                        .help("Identifier to resolve before dumping (repeatable)"),
                )
                .arg(fixtures_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ResolverConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ResolverConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ResolverConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    let config = load_config(&matches)?;
    tracing::debug!(?config, "configuration loaded");

    match matches.subcommand() {
        Some(("resolve", args)) => {
            let resolver =
                commands::build_resolver(config, args.get_one::<PathBuf>("fixtures").map(PathBuf::as_path))?;

            let request_uri = args
                .get_one::<String>("request-uri")
                .map_or(commands::DEFAULT_REQUEST_URI, String::as_str);
            let mut request = ResolveRequest::new(request_uri);
            if let Some(iri) = args.get_one::<String>("iri") {
                request = request.with_iri(iri.as_str());
            }
            if let Some(agent) = args.get_one::<String>("user-agent") {
                request = request.with_user_agent(agent.as_str());
            }

            match commands::resolve(&resolver, request, args.get_flag("json")).await {
                Ok(out) => print!("{out}"),
                Err(e) => {
                    eprintln!("Resolution failed: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Some(("stress", args)) => {
            let resolver =
                commands::build_resolver(config, args.get_one::<PathBuf>("fixtures").map(PathBuf::as_path))?;
            let iri = args
                .get_one::<String>("iri")
                .context("--iri is required")?;
            let count = args.get_one::<usize>("count").copied().unwrap_or(100);

            let report = commands::stress(&resolver, iri, count).await?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("log", args)) => {
            let resolver =
                commands::build_resolver(config, args.get_one::<PathBuf>("fixtures").map(PathBuf::as_path))?;
            let iris: Vec<String> = args
                .get_many::<String>("iri")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();

            print!("{}", commands::dump_log(&resolver, &iris).await?);
        }
        _ => {}
    }

    Ok(())
}
