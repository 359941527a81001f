//! `portal` entry-point: loads settings, wires adapters, runs one command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use portal::inbound::cli::{self, Cli, Portal};
use portal::settings::PortalSettings;

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = Cli::parse();
    let settings = PortalSettings::load_from_iter([OsString::from("portal")])
        .map_err(|err| eyre!("failed to load portal settings: {err}"))?;
    let portal = Portal::from_settings(&settings)?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build portal runtime")?;
    let mut stdout = io::stdout().lock();
    runtime.block_on(cli::run(&portal, args.command, &mut stdout))?;
    Ok(())
}
