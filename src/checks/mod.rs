//! Assertions on module outputs and plan text.
//!
//! Every assertion becomes a [`CheckOutcome`]; failures are collected into a
//! [`CheckReport`] instead of stopping at the first one.

mod outputs;
mod plan;
mod result;

pub use outputs::{check_web_app_outputs, PRINCIPAL_ID, WEB_APP_HOSTNAME, WEB_APP_URL};
pub use plan::{check_plan_resources, PlanSummary, DEFAULT_PLAN_RESOURCES};
pub use result::{CheckOutcome, CheckReport};
