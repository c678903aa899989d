//! Entry point for the netdash TUI. Parses args, resolves the profile and runs the App.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use netdash::api::DashboardApi;
use netdash::app::App;
use netdash::config::{check_refresh, Config, Environment, Overrides, ENV_LOG};
use netdash::dashboard::Dashboard;
use netdash::mock::MockBackend;
use netdash::profiles::{
    config_dir, load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile,
};
use netdash::timer::DEFAULT_INTERVAL;

const USAGE: &str = "[--tls-ca CERT_PEM|-t CERT_PEM] [--profile NAME|-P NAME] [--user NAME|-u NAME] [--interval MS|-i MS] [--save] [--demo] [--dry-run] [--log FILE] [http(s)://HOST:PORT]";

#[derive(Debug, Default)]
struct ParsedArgs {
    url: Option<String>,
    tls_ca: Option<String>,
    profile: Option<String>,
    user: Option<String>,
    interval_ms: Option<u64>,
    log: Option<String>,
    save: bool,
    demo: bool,
    dry_run: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "netdash".into());
    let usage = format!("Usage: {prog} {USAGE}");
    let mut p = ParsedArgs::default();

    let parse_ms = |v: Option<String>| -> Result<Option<u64>, String> {
        match v {
            Some(s) => s
                .parse::<u64>()
                .map(Some)
                .map_err(|_| format!("invalid --interval '{s}' (milliseconds)\n{usage}")),
            None => Ok(None),
        }
    };

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage.clone()),
            "--tls-ca" | "-t" => p.tls_ca = it.next(),
            "--profile" | "-P" => p.profile = it.next(),
            "--user" | "-u" => p.user = it.next(),
            "--interval" | "-i" => p.interval_ms = parse_ms(it.next())?,
            "--log" => p.log = it.next(),
            "--save" => p.save = true,
            "--demo" => p.demo = true,
            "--dry-run" => p.dry_run = true,
            _ if arg.starts_with("--") && arg.contains('=') => {
                let Some((k, v)) = arg.split_once('=') else {
                    continue;
                };
                if v.is_empty() {
                    continue;
                }
                let v = v.to_string();
                match k {
                    "--tls-ca" => p.tls_ca = Some(v),
                    "--profile" => p.profile = Some(v),
                    "--user" => p.user = Some(v),
                    "--interval" => p.interval_ms = parse_ms(Some(v))?,
                    "--log" => p.log = Some(v),
                    _ => return Err(format!("Unknown option {k}. {usage}")),
                }
            }
            _ => {
                if p.url.is_none() {
                    p.url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. {usage}"));
                }
            }
        }
    }
    Ok(p)
}

fn init_logging(path: Option<&str>) -> Result<PathBuf> {
    let path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("netdash.log"));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .init();
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };
    let log_path = init_logging(parsed.log.as_deref())?;
    info!(log = %log_path.display(), "netdash starting");

    let refresh = parsed
        .interval_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or(DEFAULT_INTERVAL);
    let refresh = check_refresh(refresh)?;

    // Demo mode short-circuit
    if parsed.demo || matches!(parsed.profile.as_deref(), Some("demo")) {
        if parsed.dry_run {
            println!("demo mode (in-memory backend)");
            return Ok(());
        }
        return run_dashboard(MockBackend::new(), "demo (in-memory)", refresh).await;
    }

    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        username: parsed.user.clone(),
        tls_ca: parsed.tls_ca.clone(),
        refresh_ms: parsed.interval_ms,
    };

    let mut profiles_mut = profiles_file.clone();
    let entry: ProfileEntry = match req.resolve(&profiles_file) {
        ResolveProfile::Direct(entry) => {
            // Possibly save if a profile name was given
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name).cloned() {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), entry.clone());
                        save_profiles(&profiles_mut).context("saving profiles")?;
                        info!(profile = %name, "profile created");
                    }
                    Some(existing) if existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!("Overwrite existing profile '{name}'? [y/N]: "));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry.clone());
                            save_profiles(&profiles_mut).context("saving profiles")?;
                            info!(profile = %name, "profile updated");
                        }
                    }
                    Some(_) => {}
                }
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(mut names) => {
            // Always offer the demo backend
            if !names.iter().any(|n| n == "demo") {
                names.push("demo".into());
            }
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let Some(name) = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
            else {
                return Ok(());
            };
            if name == "demo" {
                return run_dashboard(MockBackend::new(), "demo (in-memory)", refresh).await;
            }
            match profiles_mut.profiles.get(name) {
                Some(entry) => entry.clone(),
                None => return Ok(()),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (http://HOST:PORT or https://...): ")?;
            if url.trim().is_empty() {
                return Ok(());
            }
            let user = prompt_string("Enter username (or leave blank): ")?;
            let ca = prompt_string("Enter TLS CA path (or leave blank): ")?;
            let non_empty = |s: String| {
                let s = s.trim().to_string();
                (!s.is_empty()).then_some(s)
            };
            let entry = ProfileEntry {
                url: url.trim().to_string(),
                username: non_empty(user).or(parsed.user.clone()),
                tls_ca: non_empty(ca).or(parsed.tls_ca.clone()),
                refresh_ms: parsed.interval_ms,
            };
            profiles_mut.profiles.insert(name.clone(), entry.clone());
            save_profiles(&profiles_mut).context("saving profiles")?;
            entry
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(());
        }
    };

    let overrides = Overrides {
        username: parsed.user.clone(),
        tls_ca: parsed.tls_ca.clone(),
        refresh_ms: parsed.interval_ms,
    };
    let config = Config::merge(&entry, &overrides, &Environment::from_process())?;
    info!(?config, "configuration resolved");

    if parsed.dry_run {
        println!(
            "{} as {} every {}ms",
            config.base_url,
            config.username,
            config.refresh.as_millis()
        );
        return Ok(());
    }

    let client = config.build_client()?;
    let endpoint = config.base_url.to_string();
    run_dashboard(client, &endpoint, config.refresh).await
}

async fn run_dashboard<A: DashboardApi>(
    api: A,
    endpoint: &str,
    refresh: std::time::Duration,
) -> Result<()> {
    let mut app = App::new(Dashboard::new(api, refresh), endpoint);
    app.run().await
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("netdash")
            .chain(v.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn long_short_and_equals_forms() {
        let p = parse_args(args(&["-t", "ca.pem", "-P", "prod", "-u", "ops", "-i", "5000", "http://h:5000"])).unwrap();
        assert_eq!(p.tls_ca.as_deref(), Some("ca.pem"));
        assert_eq!(p.profile.as_deref(), Some("prod"));
        assert_eq!(p.user.as_deref(), Some("ops"));
        assert_eq!(p.interval_ms, Some(5000));
        assert_eq!(p.url.as_deref(), Some("http://h:5000"));

        let p = parse_args(args(&["--profile=dev", "--interval=30000", "--save", "--dry-run"])).unwrap();
        assert_eq!(p.profile.as_deref(), Some("dev"));
        assert_eq!(p.interval_ms, Some(30_000));
        assert!(p.save && p.dry_run && !p.demo);
    }

    #[test]
    fn rejects_junk() {
        assert!(parse_args(args(&["http://a", "http://b"])).is_err());
        assert!(parse_args(args(&["--interval", "soon"])).is_err());
        assert!(parse_args(args(&["--bogus=1"])).is_err());
        assert!(parse_args(args(&["--help"])).unwrap_err().starts_with("Usage: netdash"));
    }
}
