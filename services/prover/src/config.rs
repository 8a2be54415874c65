//! Prover binary configuration: compiled-in defaults, an optional TOML
//! file, then CLI flags, in that precedence order.

use attest_prover_core::ProverConfig;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// TPM remote-attestation prover.
#[derive(Parser, Debug)]
#[command(name = "attest-prover", version, about)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address this prover's `/attest` endpoint binds to.
    #[arg(short, long)]
    pub address: Option<String>,

    /// Port this prover's `/attest` endpoint listens on.
    #[arg(short, long)]
    pub port: Option<String>,

    /// Logical name announced during EK registration.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Path the AK is persisted to / loaded from.
    #[arg(long)]
    pub ak: Option<PathBuf>,

    /// TPM owner password.
    #[arg(long)]
    pub owner_password: Option<String>,

    /// TPM user (SRK) password.
    #[arg(long)]
    pub user_password: Option<String>,

    /// Base URL of the verifier, e.g. `http://verifier.example:8080`.
    #[arg(long)]
    pub verifier_url: Option<String>,

    /// Emit structured JSON logs instead of human-readable text.
    #[arg(long)]
    pub json_logs: bool,
}

/// The subset of [`Cli`] fields that may also come from a config file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub address: Option<String>,
    pub port: Option<String>,
    pub name: Option<String>,
    pub ak: Option<PathBuf>,
    pub owner_password: Option<String>,
    pub user_password: Option<String>,
    pub verifier_url: Option<String>,
}

/// Fully resolved configuration: everything a running prover needs.
pub struct ResolvedConfig {
    pub address: String,
    pub port: String,
    pub prover: ProverConfig,
}

const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "8081";
const DEFAULT_NAME: &str = "prover";
const DEFAULT_AK_PATH: &str = "ak.json";

impl ResolvedConfig {
    /// Merge CLI flags over an optional config file over compiled-in
    /// defaults: CLI wins, then file, then default.
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = attest_core::config::load_file::<FileConfig, _>(cli.config.as_ref())?
            .unwrap_or_default();

        let address = attest_core::config::resolve(
            cli.address,
            file.address,
            DEFAULT_ADDRESS.to_string(),
        );
        let port = attest_core::config::resolve(cli.port, file.port, DEFAULT_PORT.to_string());
        let name = attest_core::config::resolve(cli.name, file.name, DEFAULT_NAME.to_string());
        let ak_file =
            attest_core::config::resolve(cli.ak, file.ak, PathBuf::from(DEFAULT_AK_PATH));
        let owner_password = attest_core::config::resolve(
            cli.owner_password,
            file.owner_password,
            String::new(),
        );
        let user_password =
            attest_core::config::resolve(cli.user_password, file.user_password, String::new());
        let verifier_url = cli
            .verifier_url
            .or(file.verifier_url)
            .ok_or_else(|| anyhow::anyhow!("--verifier_url is required (flag or config file)"))?;

        Ok(Self {
            address,
            port,
            prover: ProverConfig {
                name,
                ak_file,
                owner_password,
                user_password,
                verifier_url,
            },
        })
    }
}
