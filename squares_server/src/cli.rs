use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current (non-secret) settings.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "SQP_HOST",
        "SQP_PORT",
        "SQP_DATABASE_URL",
        "SQP_FEED_URL",
        "SQP_FEED_TIMEOUT_SECS",
        "SQP_FEED_MAX_ATTEMPTS",
        "SQP_FEED_BACKOFF_MS",
        "SQP_POLL_LIVE_SECS",
        "SQP_POLL_PRE_GAME_SECS",
        "SQP_SETTLEMENT_MAX_ATTEMPTS",
        "SQP_SUPERVISOR_SECS",
        "SQP_DISABLE_POLLER",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
