use std::io::BufRead;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};
use netlog_core::EntityStore;
use netlog_wire::{Frame, LineFramer};
use tracing::info;

fn verbosity_filter(count: u8) -> &'static str {
    match count {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(netlog_path: &PathBuf, output_path: &PathBuf) -> anyhow::Result<()> {
    let file = std::fs::File::open(netlog_path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", netlog_path.display()))?;
    let reader = std::io::BufReader::new(file);

    let mut store = EntityStore::new();
    let mut framer = LineFramer::new();
    for line in reader.lines() {
        let line = line.map_err(|e| anyhow::anyhow!("failed to read {}: {e}", netlog_path.display()))?;
        match framer.feed_line(&line) {
            Some(Frame::Constants(value)) => store.load_constants(&value),
            Some(Frame::Event(value)) => store.handle_event(&value),
            None => {}
        }
    }

    let records = store.run_post_process();
    info!(count = records.len(), "joined request records");
    netlog_runner::write_netlog_requests(output_path, &records)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", output_path.display()))?;
    Ok(())
}

fn main() {
    let matches = Command::new("netlog-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Joins a Chrome NetLog event stream into per-request timing records")
        .arg(
            Arg::new("netlog")
                .help("Path to a completed NetLog JSON file")
                .short('n')
                .long("netlog")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .help("Where to write the joined request records (.json or .json.gz)")
                .short('o')
                .long("output")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .help("Increase log verbosity (-v, -vv)")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count),
        )
        .get_matches();

    let verbosity = matches.get_count("verbose");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity_filter(verbosity))),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "netlog-cli starting");

    let netlog_path = matches.get_one::<PathBuf>("netlog").expect("required").clone();
    let output_path = matches.get_one::<PathBuf>("output").expect("required").clone();

    if let Err(err) = run(&netlog_path, &output_path) {
        eprintln!("FATAL: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_end_to_end_on_a_minimal_log() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.json");
        std::fs::write(
            &input_path,
            concat!(
                r#"{"constants":{"logEventTypes":{"URL_REQUEST":1},"#,
                r#""logSourceType":{"URL_REQUEST":1},"logEventPhase":{"PHASE_NONE":0}}}"#,
                "\n",
                r#""events": ["#,
                "\n",
                r#"{"type":1,"phase":0,"time":"5","source":{"type":1,"id":1},"params":{"url":"https://example.com/","method":"GET"}},"#,
                "\n",
                "]}\n",
            ),
        )
        .unwrap();
        let output_path = dir.path().join("out.json");

        run(&input_path, &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let output_path = dir.path().join("out.json");
        assert!(run(&missing, &output_path).is_err());
    }
}
