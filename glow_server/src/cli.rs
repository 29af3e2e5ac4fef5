use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // Secrets (GLOW_ADMIN_TOKEN, GLOW_PAYNL_TOKEN) are deliberately not listed
    const DISPLAY_ENVS: [&str; 18] = [
        "RUST_LOG",
        "GLOW_HOST",
        "GLOW_PORT",
        "GLOW_DATABASE_URL",
        "GLOW_USE_X_FORWARDED_FOR",
        "GLOW_USE_FORWARDED",
        "GLOW_RECONCILE_INTERVAL",
        "GLOW_JANITOR_INTERVAL",
        "GLOW_CACHE_RETENTION",
        "GLOW_PROVIDER_TIMEOUT",
        "GLOW_PAYNL_API_URL",
        "GLOW_PAYNL_STATUS_URL",
        "GLOW_PAYNL_EXCHANGE_URL",
        "GLOW_PAYNL_TEST_MODE",
        "GLOW_PAYCONIQ_API_URL",
        "GLOW_PAYCONIQ_CALLBACK_URL",
        "GLOW_PAYCONIQ_TEST_MODE",
        "GLOW_SITE_DOMAIN",
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
