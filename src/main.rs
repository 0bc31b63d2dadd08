use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tour_proxy::cli::{self, ArgumentParser, CacheConfigBuilder, SearchFlags, KIND_CALL, KIND_SEARCH};
use tour_proxy::client::{plan_search, ApiClient, ApiError, Endpoint, Locale, Paging, SearchFilters};
use tour_proxy::config::AppConfig;
use tour_proxy::error::TourError;
use tour_proxy::output::OutputEnvelope;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tour-proxy")]
#[command(about = "Caching edge proxy and client for the Korea Tourism Organization TourAPI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); falls back to $TOUR_PROXY_CONFIG
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the caching edge proxy
    Serve {
        /// Listen address (e.g., "0.0.0.0:8787")
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Disable the edge cache
        #[arg(long)]
        no_cache: bool,

        /// Edge cache TTL in seconds
        #[arg(long, value_name = "SECS")]
        cache_ttl: Option<u64>,
    },

    /// Call one upstream operation through the proxy
    Call {
        /// Locale code (ko, en, ja, zh, de, fr)
        #[arg(short, long, default_value = "ko")]
        locale: String,

        /// Operation name (e.g., "areaBasedList2")
        #[arg(value_name = "ENDPOINT")]
        endpoint: String,

        /// Key-value parameters (e.g., "areaCode=1")
        #[arg(short, long)]
        args: Vec<String>,

        /// JSON object of parameters
        #[arg(long)]
        json: Option<String>,

        /// Bypass the client cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Search content, routing the festival category to the festival operation
    Search {
        /// Locale code (ko, en, ja, zh, de, fr)
        #[arg(short, long, default_value = "ko")]
        locale: String,

        #[arg(short, long)]
        keyword: Option<String>,

        /// Area code
        #[arg(long)]
        area: Option<String>,

        /// Top-level category code (C01 = festivals)
        #[arg(long)]
        category: Option<String>,

        /// Event start date, YYYY-MM-DD (festival search)
        #[arg(long)]
        start_date: Option<String>,

        /// Event end date, YYYY-MM-DD (festival search)
        #[arg(long)]
        end_date: Option<String>,

        /// Page number, starting at 1
        #[arg(long)]
        page: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a single JSON document
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return print_and_exit(OutputEnvelope::error(e.code(), &e.to_string()));
        }
    };

    match cli.command {
        Commands::Serve {
            bind,
            no_cache,
            cache_ttl,
        } => {
            let mut proxy = config.proxy;
            if let Some(bind) = bind {
                proxy.bind = bind;
            }
            proxy.cache = CacheConfigBuilder::from_cli_flags(proxy.cache, no_cache, cache_ttl);
            info!("Starting tour-proxy v{}", tour_proxy::VERSION);
            tour_proxy::proxy::serve(proxy).await?;
            Ok(())
        }
        Commands::Call {
            locale,
            endpoint,
            args,
            json,
            no_cache,
        } => {
            let started = Instant::now();
            let output = handle_call(config, &locale, &endpoint, args, json, no_cache, started).await;
            print_and_exit(output)
        }
        Commands::Search {
            locale,
            keyword,
            area,
            category,
            start_date,
            end_date,
            page,
        } => {
            let started = Instant::now();
            let flags = SearchFlags {
                keyword,
                area,
                category,
                start_date,
                end_date,
                page,
            };
            let output = handle_search(config, &locale, flags, started).await;
            print_and_exit(output)
        }
    }
}

async fn handle_call(
    mut config: AppConfig,
    locale: &str,
    endpoint: &str,
    args: Vec<String>,
    json: Option<String>,
    no_cache: bool,
    started: Instant,
) -> OutputEnvelope {
    let parsed = endpoint
        .parse::<Endpoint>()
        .and_then(|endpoint| Ok((endpoint, ArgumentParser::parse_arguments(args, json)?)));
    let (endpoint, params) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return failure(e, locale, Some(endpoint)),
    };

    config.client.cache = CacheConfigBuilder::from_cli_flags(config.client.cache, no_cache, None);
    let client = match ApiClient::new(config.client) {
        Ok(client) => client,
        Err(e) => return failure(e, locale, Some(endpoint.path())),
    };

    let result = client.call_with_code(locale, endpoint, &params).await;
    cli::to_output(KIND_CALL, locale, Some(endpoint.path()), result, started)
}

async fn handle_search(config: AppConfig, locale: &str, flags: SearchFlags, started: Instant) -> OutputEnvelope {
    let parsed_locale = match locale.parse::<Locale>() {
        Ok(parsed) => parsed,
        Err(e) => return failure(e, locale, None),
    };

    let client = match ApiClient::new(config.client) {
        Ok(client) => client,
        Err(e) => return failure(e, locale, None),
    };

    let (filters, paging) = flags.into_filters();
    let endpoint = search_endpoint_name(&filters);
    let result = client.search(parsed_locale, &filters, paging).await;
    cli::to_output(KIND_SEARCH, locale, endpoint, result, started)
}

fn search_endpoint_name(filters: &SearchFilters) -> Option<&'static str> {
    plan_search(filters, Paging::default())
        .ok()
        .map(|(endpoint, _)| endpoint.path())
}

fn failure(err: TourError, locale: &str, endpoint: Option<&str>) -> OutputEnvelope {
    let err = ApiError::new(locale.parse().unwrap_or(Locale::Ko), None, err);
    cli::error_output(&err, Some(locale), endpoint)
}

fn print_and_exit(output: OutputEnvelope) -> Result<()> {
    println!("{}", output.to_json()?);
    if !output.ok {
        std::process::exit(1);
    }
    Ok(())
}
