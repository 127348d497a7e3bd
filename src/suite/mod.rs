//! The web app module test cases and the driver that runs them.
//!
//! `basic` applies the module, checks its outputs, probes the web app and
//! destroys everything again. `plan` only plans and checks that the expected
//! resources show up. Cases share no mutable state and run on their own
//! threads.

mod report;
mod workspace;

pub use report::{CaseReport, SuiteReport};
pub use workspace::Workspace;

use reqwest::Url;
use std::thread;

use crate::checks::{
    check_plan_resources, check_web_app_outputs, CheckOutcome, PlanSummary, WEB_APP_URL,
};
use crate::config::{ModuleConfig, SuiteConfig};
use crate::deployment::Deployment;
use crate::error::Result;
use crate::probe::{ProbeResult, Prober, Sleeper, Transport};
use crate::terraform::Provisioner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum CaseKind {
    Basic,
    Plan,
}

impl CaseKind {
    pub const ALL: [CaseKind; 2] = [CaseKind::Basic, CaseKind::Plan];

    pub fn name(self) -> &'static str {
        match self {
            CaseKind::Basic => "basic",
            CaseKind::Plan => "plan",
        }
    }
}

/// Run `cases` concurrently, one thread each. Reports come back in `cases` order.
pub fn run_suite<P, T, S>(
    provisioner: &P,
    prober: &Prober<T, S>,
    config: &SuiteConfig,
    cases: &[CaseKind],
) -> SuiteReport
where
    P: Provisioner + Sync + ?Sized,
    T: Transport + Sync,
    S: Sleeper + Sync,
{
    let run_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(run_id = %run_id, cases = cases.len(), "starting suite");

    let reports = thread::scope(|scope| {
        let handles: Vec<_> = cases
            .iter()
            .map(|&kind| {
                let handle = scope.spawn(move || match kind {
                    CaseKind::Basic => run_basic_case(provisioner, prober, config),
                    CaseKind::Plan => run_plan_case(provisioner, config),
                });
                (kind, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(kind, handle)| {
                handle.join().unwrap_or_else(|_| {
                    let mut report = CaseReport::start(kind.name());
                    report.error = Some("case panicked".to_string());
                    report.finish()
                })
            })
            .collect()
    });

    SuiteReport {
        run_id,
        cases: reports,
    }
}

/// Apply, check outputs, probe, destroy. Destroy runs on every path once
/// anything may have been created.
pub fn run_basic_case<P, T, S>(
    provisioner: &P,
    prober: &Prober<T, S>,
    config: &SuiteConfig,
) -> CaseReport
where
    P: Provisioner + ?Sized,
    T: Transport,
    S: Sleeper,
{
    let _span = tracing::info_span!("case", name = "basic").entered();
    let mut report = CaseReport::start(CaseKind::Basic.name());

    if let Err(e) = basic_steps(provisioner, prober, config, &mut report) {
        tracing::error!("basic case aborted: {e}");
        report.error = Some(e.to_string());
    }
    report.finish()
}

fn basic_steps<P, T, S>(
    provisioner: &P,
    prober: &Prober<T, S>,
    config: &SuiteConfig,
    report: &mut CaseReport,
) -> Result<()>
where
    P: Provisioner + ?Sized,
    T: Transport,
    S: Sleeper,
{
    let policy = config.probe_policy()?;
    let mut workspace = prepare_workspace(&config.basic_module(), config)?;
    let module = workspace.module().clone();

    // The guard owns the workspace; a failed destroy, explicit or in Drop,
    // keeps the copy so its state file survives.
    let deployment = Deployment::new(provisioner, module).on_failed_destroy(move |e| {
        let kept = workspace.persist();
        tracing::error!("destroy failed, state kept in {}: {e}", kept.display());
    });

    let outputs = match deployment.init_and_apply() {
        Ok(outputs) => outputs,
        Err(e) => {
            if let Err(destroy_err) = deployment.destroy() {
                report
                    .checks
                    .push(CheckOutcome::failed("destroy", destroy_err.to_string()));
            }
            return Err(e);
        }
    };

    report.checks.extend(check_web_app_outputs(&outputs));

    match outputs.get(WEB_APP_URL).map(Url::parse) {
        Some(Ok(url)) => {
            let result = prober.probe(&url, &policy);
            record_probe(report, &url, result);
        }
        Some(Err(e)) => report.checks.push(CheckOutcome::failed(
            "web app accessible",
            format!("cannot probe, {WEB_APP_URL} is not a valid URL: {e}"),
        )),
        None => report.checks.push(CheckOutcome::failed(
            "web app accessible",
            format!("cannot probe, {WEB_APP_URL} is not declared"),
        )),
    }

    deployment.destroy().map_err(|e| {
        report.checks.push(CheckOutcome::failed("destroy", e.to_string()));
        e
    })
}

fn record_probe(report: &mut CaseReport, url: &Url, result: ProbeResult) {
    if result.succeeded {
        let status = result.last_status.unwrap_or_default();
        report.checks.push(CheckOutcome::passed(
            "web app accessible",
            format!(
                "web app is accessible at {url} (status {status}, attempt {})",
                result.attempts
            ),
        ));
        report.checks.push(CheckOutcome::check(
            "response over https",
            result.secure_transport == Some(true),
            "response was served over HTTPS",
            "response should be over HTTPS",
        ));
    } else {
        report.checks.push(CheckOutcome::failed(
            "web app accessible",
            format!(
                "failed to access web app at {url} after {} attempts",
                result.attempts
            ),
        ));
    }
    report.probe = Some(result);
}

/// Init and plan, then check the plan mentions every expected resource.
pub fn run_plan_case<P>(provisioner: &P, config: &SuiteConfig) -> CaseReport
where
    P: Provisioner + ?Sized,
{
    let _span = tracing::info_span!("case", name = "plan").entered();
    let mut report = CaseReport::start(CaseKind::Plan.name());

    if let Err(e) = plan_steps(provisioner, config, &mut report) {
        tracing::error!("plan case aborted: {e}");
        report.error = Some(e.to_string());
    }
    report.finish()
}

fn plan_steps<P>(provisioner: &P, config: &SuiteConfig, report: &mut CaseReport) -> Result<()>
where
    P: Provisioner + ?Sized,
{
    let workspace = prepare_workspace(&config.plan_module(), config)?;
    let module = workspace.module();

    provisioner.init(module)?;
    let plan_text = provisioner.plan(module)?;

    report.plan_summary = PlanSummary::parse(&plan_text);
    if let Some(summary) = &report.plan_summary {
        tracing::info!("plan: {summary}");
    }
    report
        .checks
        .extend(check_plan_resources(&plan_text, &config.cases.plan.expect_resources));
    Ok(())
}

fn prepare_workspace(module: &ModuleConfig, config: &SuiteConfig) -> Result<Workspace> {
    if config.module.isolate {
        Workspace::isolated(module, config.module_root().as_deref())
    } else {
        Workspace::in_place(module)
    }
}
