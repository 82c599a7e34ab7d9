//! Metrics collection and Prometheus export.
//!
//! Installs the `metrics` recorder backing the `/metrics` endpoint and names
//! the portal's domain counters.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const RECOVERY_CODES_ISSUED: &str = "portal_recovery_codes_issued_total";
pub const RECOVERY_VERIFICATIONS: &str = "portal_recovery_verifications_total";
pub const PASSWORD_RESETS: &str = "portal_password_resets_total";
pub const ADMIN_ACTIONS: &str = "portal_admin_actions_total";
pub const PERMISSION_DENIALS: &str = "portal_permission_denials_total";
pub const LOGINS: &str = "portal_logins_total";

/// Install the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::warn!("Metrics handle already initialized");
    }
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}
