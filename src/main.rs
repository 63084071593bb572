//! `querysplit` binary: read a pcap capture and write per-query files.

mod cli;

use std::{
    fs::File,
    io::{self, BufReader, Read},
};

use clap::Parser;
use querysplit::{DirectorySink, Driver, DriverConfig, SplitConfig, SplitterFactory, read_pcap};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let input: Box<dyn Read> = match cli.input_path() {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let config = SplitConfig::default()
        .with_responses(cli.save_responses)
        .with_server_port(cli.server_port);
    let factory = SplitterFactory::new(DirectorySink::new(&cli.output), config);
    let mut driver = Driver::new(
        factory,
        DriverConfig {
            max_buffered_bytes: cli.max_buffered_bytes,
        },
    );

    let stats = read_pcap(input, &mut driver)?;
    info!(
        sessions = driver.correlator().factory().created(),
        packets = stats.packets,
        output = %cli.output.display(),
        "done"
    );
    Ok(())
}
