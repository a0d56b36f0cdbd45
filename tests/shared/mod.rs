pub mod filetypes;

use std::path::Path;
use std::process::{Command, Output};

/// Run `asgrid-sweep` inside `dir`.
pub fn run_sweep_binary(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_asgrid-sweep"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("could not launch asgrid-sweep")
}
