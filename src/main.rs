// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use trusted_app_registry::config::{Config, LogFormat, LOG_FORMAT_ENV};
use trusted_app_registry::error::TrustedAppResult;
use trusted_app_registry::keys::encode_public_key;
use trusted_app_registry::state::AppState;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn run(config: &Config) -> TrustedAppResult<()> {
    let state = AppState::open(config)?;

    let app = state.current_app.start()?;
    let public_key = encode_public_key(app.public_key())?;
    tracing::info!(
        application_id = app.application_id(),
        algorithm = app.public_key().algorithm(),
        %public_key,
        "Current application ready"
    );

    let trusted = state.manager.get_all()?;
    tracing::info!(count = trusted.len(), "Trusted applications loaded");
    for info in &trusted {
        if !info.is_valid_key() {
            tracing::warn!(
                id = info.id(),
                application_id = info.application_id(),
                "Trusted application has an unusable public key"
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Tracing comes up first so configuration warnings are visible
    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|value| LogFormat::parse(&value))
        .unwrap_or_default();
    init_tracing(format);
    let config = Config::from_env();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Trusted application registry failed to start");
            ExitCode::FAILURE
        }
    }
}
