use crate::cli;
use crate::providers::{resolve_key, ProfileSettings};
use crate::storage::ProfileStore;

/// Offline checks of config, profile store and each profile. Returns the issue count.
pub fn cmd_doctor(
    config: &cli::AppConfig,
    config_source: &cli::ConfigSource,
    store: &ProfileStore,
) -> u32 {
    println!("🩺 akm Doctor: Diagnostic Checks");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let mut issues = 0u32;

    // 1. Config file
    match config_source {
        cli::ConfigSource::File(p) => {
            if p.exists() {
                println!("  ✅ Config file: {}", p.display());
            } else {
                println!("  ❌ Config file not found: {}", p.display());
                issues += 1;
            }
        }
        cli::ConfigSource::Url(u) => {
            println!("  ℹ️  Config from URL: {}", u);
        }
    }

    // 2. Port availability
    let addr = cli::format_bind_addr(&config.server.host, config.server.port);
    match std::net::TcpListener::bind(&addr) {
        Ok(_) => println!("  ✅ Port {}: available", config.server.port),
        Err(_) => println!(
            "  ℹ️  Port {}: in use (akm serve may already be running)",
            config.server.port
        ),
    }

    // 3. Web layer auth
    if config.server.api_key.is_some() {
        println!("  ✅ Server API key: set");
    } else {
        println!("  ℹ️  Server API key: not set (web layer is open)");
    }

    // 4. Profile store
    let profiles = match store.list() {
        Ok(profiles) => {
            println!(
                "  ✅ Profiles file: {} ({} profiles)",
                store.path().display(),
                profiles.len()
            );
            profiles
        }
        Err(e) => {
            println!("  ❌ Profiles file: {}", e);
            issues += 1;
            Vec::new()
        }
    };

    // 5. Each profile
    for profile in &profiles {
        let mut problems = Vec::new();
        if profile.base_url().is_none() {
            problems.push("no baseUrl".to_string());
        }
        if resolve_key(profile, None).is_err() {
            problems.push("no usable key".to_string());
        }
        if let Err(e) = ProfileSettings::resolve(profile) {
            problems.push(e.to_string());
        }

        if problems.is_empty() {
            println!("  ✅ Profile '{}'", profile.name);
        } else {
            println!("  ❌ Profile '{}': {}", profile.name, problems.join("; "));
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {} issue(s) found", issues);
    }
    issues
}
