//! Renders the `gab(1)` manual page into `OUT_DIR` from the same clap
//! definitions the binary parses with.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::{env, fs, io};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

const MAN_PAGE: &str = "gab.1";

fn main() -> Result<(), Box<dyn Error>> {
    let mut cargo = io::stdout().lock();
    for watched in ["build.rs", "src/cli/mod.rs"] {
        writeln!(cargo, "cargo:rerun-if-changed={watched}")?;
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "cargo did not set OUT_DIR"))?;

    let mut page = Vec::new();
    Man::new(cli::Cli::command()).render(&mut page)?;
    fs::write(out_dir.join(MAN_PAGE), page)?;

    Ok(())
}
