mod application;
mod domain;
mod infrastructure;
mod presentation;

use crate::application::endpoint::EndpointResolver;
use crate::application::results::ResultsSink;
use crate::application::services::QueryService;
use crate::domain::errors::QueryError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HyperHttpClient;
use crate::infrastructure::prompt::TerminalPrompt;
use crate::infrastructure::state_store::FileStateStore;
use crate::presentation::cli::Cli;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

/// esq: send search requests written as plain text
///
/// Reads a request such as `GET /_search?q=foo` followed by optional headers
/// and a JSON body, sends it to the workspace's search endpoint and prints a
/// report with timing and the pretty-printed response.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.workspace.as_deref(), cli.verbose) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("{:#}", err).red());
            std::process::exit(1);
        }
    };
    infrastructure::logging::init(&config);

    let store = FileStateStore::new(config.state_file.clone(), config.workspace.clone());
    let endpoints = EndpointResolver::new(Box::new(store), Box::new(TerminalPrompt));
    let service = QueryService::new(
        Box::new(HyperHttpClient::new()),
        endpoints,
        Arc::new(ResultsSink::new()),
    );

    if let Err(err) = cli.run(&service).await {
        eprintln!("{}", format!("{:#}", err).red());
        if err.downcast_ref::<QueryError>().is_some_and(QueryError::is_parse_failure) {
            eprintln!("{}", "Expected a request line such as `GET /_search?q=foo`".yellow());
        }
        std::process::exit(1);
    }
}
