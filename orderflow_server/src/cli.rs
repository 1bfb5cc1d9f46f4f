use std::{env, env::VarError};

use crate::config::CONFIG_ENV_VARS;

const README: &str = include_str!("./cli-help.txt");

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        println!("\n{README}\n");
        println!("Current environment values:");
        env_report().iter().for_each(|(name, val)| println!("  {name:<35} {val:<15}"));
    }
    has_cli_args
}

/// The current value of `RUST_LOG` and of every variable the server configuration reads.
fn env_report() -> Vec<(&'static str, String)> {
    std::iter::once("RUST_LOG")
        .chain(CONFIG_ENV_VARS)
        .map(|name| {
            let val = match env::var(name) {
                Ok(s) => s,
                Err(VarError::NotPresent) => "Not set".into(),
                Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
            };
            (name, val)
        })
        .collect()
}
