//! Verifier binary configuration: compiled-in defaults, an optional
//! TOML file, then CLI flags, in that precedence order.

use attest_verifier_core::VerifierConfig;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// TPM remote-attestation verifier.
#[derive(Parser, Debug)]
#[command(name = "attest-verifier", version, about)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address the verifier's HTTP listener binds to.
    #[arg(short, long)]
    pub address: Option<String>,

    /// Port the verifier's HTTP listener binds to.
    #[arg(short, long)]
    pub port: Option<String>,

    /// Interval between attestation scheduler rounds, e.g. "30s", "5m".
    #[arg(short, long)]
    pub attestation_interval: Option<String>,

    /// Owner password handed out to provers via
    /// `getNewEdgeInitParameters`.
    #[arg(long)]
    pub owner_password: Option<String>,

    /// User (SRK) password handed out alongside the owner password.
    #[arg(long)]
    pub user_password: Option<String>,

    /// Path to the reference PCR database.
    #[arg(long)]
    pub pcr_db: Option<PathBuf>,

    /// Emit structured JSON logs instead of human-readable text.
    #[arg(long)]
    pub json_logs: bool,
}

/// The subset of [`Cli`] fields that may also come from a config file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub address: Option<String>,
    pub port: Option<String>,
    pub attestation_interval_secs: Option<u64>,
    pub owner_password: Option<String>,
    pub user_password: Option<String>,
    pub pcr_db: Option<PathBuf>,
}

const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Parse a duration flag like `"30s"`, `"5m"`, or a bare number of
/// seconds.
fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let duration = if let Some(secs) = s.strip_suffix('s') {
        Duration::from_secs(secs.parse()?)
    } else if let Some(mins) = s.strip_suffix('m') {
        Duration::from_secs(mins.parse::<u64>()? * 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        Duration::from_secs(hours.parse::<u64>()? * 3600)
    } else {
        Duration::from_secs(s.parse()?)
    };
    if duration.is_zero() {
        anyhow::bail!("attestation_interval must be non-zero");
    }
    Ok(duration)
}

/// Merge CLI flags over an optional config file over compiled-in
/// defaults: CLI wins, then file, then default.
pub fn resolve(cli: Cli) -> anyhow::Result<VerifierConfig> {
    let file = attest_core::config::load_file::<FileConfig, _>(cli.config.as_ref())?
        .unwrap_or_default();

    let address =
        attest_core::config::resolve(cli.address, file.address, DEFAULT_ADDRESS.to_string());
    let port = attest_core::config::resolve(cli.port, file.port, DEFAULT_PORT.to_string());

    let attestation_interval = match cli.attestation_interval {
        Some(raw) => parse_duration(&raw)?,
        None => match file.attestation_interval_secs {
            Some(0) => anyhow::bail!("attestation_interval_secs must be non-zero"),
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_INTERVAL_SECS),
        },
    };

    let owner_password =
        attest_core::config::resolve(cli.owner_password, file.owner_password, String::new());
    let user_password =
        attest_core::config::resolve(cli.user_password, file.user_password, String::new());
    let pcr_db_path = attest_core::config::resolve(
        cli.pcr_db,
        file.pcr_db,
        PathBuf::from(attest_verifier_core::pcr_db::DEFAULT_PCR_DB_PATH),
    );

    Ok(VerifierConfig {
        address,
        port,
        attestation_interval,
        owner_password,
        user_password,
        pcr_db_path,
    })
}
