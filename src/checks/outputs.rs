//! Assertions on the outputs of the web app module

use super::result::{CheckOutcome, CheckReport};
use crate::terraform::OutputSet;

pub const WEB_APP_URL: &str = "web_app_url";
pub const WEB_APP_HOSTNAME: &str = "web_app_hostname";
pub const PRINCIPAL_ID: &str = "managed_identity_principal_id";

/// Non-empty checks on the three outputs, then the URL shape checks.
pub fn check_web_app_outputs(outputs: &OutputSet) -> CheckReport {
    let mut report = CheckReport::new();

    for name in [WEB_APP_URL, WEB_APP_HOSTNAME, PRINCIPAL_ID] {
        report.push(check_not_empty(outputs, name));
    }

    let url = outputs.get(WEB_APP_URL).unwrap_or_default();
    let hostname = outputs.get(WEB_APP_HOSTNAME).unwrap_or_default();

    report.push(CheckOutcome::check(
        "web_app_url uses https",
        url.starts_with("https://"),
        format!("{url} uses HTTPS"),
        format!("web app URL should use HTTPS, got '{url}'"),
    ));
    report.push(CheckOutcome::check(
        "web_app_url contains hostname",
        !hostname.is_empty() && url.contains(hostname),
        format!("{url} contains {hostname}"),
        format!("web app URL '{url}' should contain the hostname '{hostname}'"),
    ));

    report
}

fn check_not_empty(outputs: &OutputSet, name: &str) -> CheckOutcome {
    let check_name = format!("{name} not empty");
    match outputs.get(name) {
        None => CheckOutcome::failed(check_name, format!("output '{name}' is not declared")),
        Some(value) if value.trim().is_empty() => {
            CheckOutcome::failed(check_name, format!("output '{name}' should not be empty"))
        }
        Some(value) => CheckOutcome::passed(check_name, format!("{name} = {value}")),
    }
}
