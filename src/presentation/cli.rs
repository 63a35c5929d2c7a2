use crate::application::services::QueryService;
use crate::domain::value_objects::Endpoint;
use crate::infrastructure::output::{attach_file_writer, print_results};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

/// CLI configuration for esq
#[derive(Parser, Debug)]
#[command(name = "esq", version)]
#[command(about = "Run search requests written as plain text", long_about = None)]
pub struct Cli {
    /// Directory whose stored endpoint is used (defaults to the current one)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send the request written in FILE (or stdin)
    Run {
        /// Request file, `-` or nothing for stdin
        file: Option<PathBuf>,

        /// Only use lines START:END of the input (1-based, inclusive)
        #[arg(long, value_parser = parse_line_range)]
        lines: Option<(usize, usize)>,

        /// Endpoint for this run only; the stored one is left alone
        #[arg(long)]
        host: Option<String>,

        /// Also write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not print the report
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the endpoint requests are sent to
    Host,
    /// Store the endpoint, asking for it when HOST is omitted
    SetHost { host: Option<String> },
}

impl Cli {
    pub async fn run(&self, service: &QueryService) -> Result<()> {
        match &self.command {
            Command::Run {
                file,
                lines,
                host,
                output,
                quiet,
            } => {
                let text = read_input(file.as_ref()).await?;
                let text = match lines {
                    Some(range) => select_lines(&text, *range)?,
                    None => text,
                };
                let endpoint = match host {
                    Some(raw) => Some(
                        Endpoint::new(raw).ok_or_else(|| anyhow!("Host cannot be empty"))?,
                    ),
                    None => None,
                };

                let results = service.results();
                let writer = output
                    .as_ref()
                    .map(|path| attach_file_writer(results, path.clone()));

                let outcome = service.execute(&text, endpoint).await;
                if let Some(id) = writer {
                    results.unsubscribe(id);
                }
                let report = outcome?;

                if !quiet {
                    print_results(results);
                }

                if self.verbose {
                    eprintln!("{}", format!("Status: {}", report.status).cyan());
                }
                Ok(())
            }
            Command::Host => {
                println!("{}", service.endpoints().get_endpoint());
                Ok(())
            }
            Command::SetHost { host } => {
                let endpoints = service.endpoints();
                let updated = match host {
                    Some(raw) => endpoints.set_endpoint(raw)?.then(|| endpoints.get_endpoint()),
                    None => endpoints.prompt_for_endpoint().await?,
                };
                match updated {
                    Some(endpoint) => {
                        println!("{}", format!("Endpoint set to {}", endpoint).green())
                    }
                    None => println!("{}", "Endpoint unchanged".yellow()),
                }
                Ok(())
            }
        }
    }
}

async fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read `{}`", path.display())),
        _ => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read request from stdin")?;
            Ok(text)
        }
    }
}

fn parse_line_range(raw: &str) -> Result<(usize, usize), String> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| format!("Invalid line range '{}'. Use 'START:END'", raw))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("Invalid start line '{}'", start))?;
    let end: usize = end.trim().parse().map_err(|_| format!("Invalid end line '{}'", end))?;
    if start == 0 || end < start {
        return Err(format!("Invalid line range '{}'", raw));
    }
    Ok((start, end))
}

/// Keeps lines `start..=end` (1-based), like running an editor selection
fn select_lines(text: &str, (start, end): (usize, usize)) -> Result<String> {
    let total = text.lines().count();
    if start > total {
        bail!("Line {} is past the end of the input ({} lines)", start, total);
    }
    let selected: Vec<&str> = text.lines().skip(start - 1).take(end - start + 1).collect();
    Ok(selected.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("3:7"), Ok((3, 7)));
        assert_eq!(parse_line_range("4:4"), Ok((4, 4)));
        assert!(parse_line_range("0:3").is_err());
        assert!(parse_line_range("5:2").is_err());
        assert!(parse_line_range("5").is_err());
        assert!(parse_line_range("a:b").is_err());
    }

    #[test]
    fn test_select_lines() {
        let text = "GET /a\n\nPOST /b\n{\"x\": 1}\n";
        assert_eq!(select_lines(text, (3, 4)).unwrap(), "POST /b\n{\"x\": 1}");
        assert_eq!(select_lines(text, (3, 99)).unwrap(), "POST /b\n{\"x\": 1}");
        assert!(select_lines(text, (9, 10)).is_err());
    }

    #[test]
    fn test_cli_parses_run_arguments() {
        let cli = Cli::try_parse_from([
            "esq", "run", "query.http", "--lines", "2:5", "--host", "es:9200", "-q",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                file, lines, host, quiet, ..
            } => {
                assert_eq!(file, Some(PathBuf::from("query.http")));
                assert_eq!(lines, Some((2, 5)));
                assert_eq!(host.as_deref(), Some("es:9200"));
                assert!(quiet);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_set_host() {
        let cli = Cli::try_parse_from(["esq", "--workspace", "/tmp", "set-host"]).unwrap();
        assert!(matches!(cli.command, Command::SetHost { host: None }));
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp")));
    }
}
