//! Command line interface for the `querysplit` binary.
//!
//! Kept free of crate imports so the build script can include it to render
//! the manual page.

use std::path::{Path, PathBuf};

use clap::Parser;

/// Split captured `MySQL` connections into one file per query.
#[derive(Debug, Parser)]
#[command(name = "querysplit", version, about)]
pub struct Cli {
    /// Legacy pcap capture to read; `-` or nothing reads standard input.
    pub input: Option<PathBuf>,

    /// Also store server responses, flushed before each client packet.
    #[arg(short = 's', long)]
    pub save_responses: bool,

    /// Directory receiving one subdirectory per connection.
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Port identifying the server side of a connection.
    #[arg(short = 'p', long, default_value_t = 3306)]
    pub server_port: u16,

    /// Out-of-order bytes held per direction before a gap is skipped.
    #[arg(long, default_value_t = 1024 * 1024)]
    pub max_buffered_bytes: usize,
}

impl Cli {
    /// Input path, or `None` when standard input should be read.
    #[must_use]
    #[cfg_attr(not(test), allow(dead_code, reason = "unused by the build script"))]
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|path| path.as_os_str() != "-")
    }
}
