use crate::application::results::{RESULTS_URI, ResultsSink, SubscriptionId};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, error};

const RESPONSE_HEADING: &str = "[Response]";

/// Prints the current results document to stdout
pub fn print_results(sink: &ResultsSink) {
    if let Some(text) = render_results(sink) {
        print!("{}", text);
    }
}

fn render_results(sink: &ResultsSink) -> Option<String> {
    sink.read(RESULTS_URI)
        .filter(|content| !content.is_empty())
        .map(|content| colorize_report(&content))
}

/// Writes every published report to `path`, replacing the previous one
pub fn attach_file_writer(sink: &ResultsSink, path: PathBuf) -> SubscriptionId {
    sink.subscribe(move |uri, content| match std::fs::write(&path, content) {
        Ok(()) => debug!(%uri, path = %path.display(), "saved results"),
        Err(e) => error!(path = %path.display(), error = %e, "failed to save results"),
    })
}

/// Headings in cyan, JSON bodies in green
pub fn colorize_report(report: &str) -> String {
    let Some(split) = report.find(RESPONSE_HEADING) else {
        return report.to_string();
    };
    let (info, rest) = report.split_at(split);
    let body = &rest[RESPONSE_HEADING.len()..];

    let mut out = String::new();
    for line in info.split_inclusive('\n') {
        if line.starts_with('[') {
            out.push_str(&line.trim_end().cyan().bold().to_string());
            out.push('\n');
        } else {
            out.push_str(line);
        }
    }
    out.push_str(&RESPONSE_HEADING.cyan().bold().to_string());

    if serde_json::from_str::<Value>(body.trim()).is_ok() {
        out.push_str(&body.green().to_string());
    } else {
        out.push_str(&body.white().to_string());
    }
    out
}
