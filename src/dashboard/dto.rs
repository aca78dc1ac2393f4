use serde::Serialize;

use crate::dashboard::repo::{BillingRecord, Document};

/// Profile block of the dashboard payload.
#[derive(Debug, Serialize)]
pub struct DashboardProfile {
    pub name: String,
    pub email: String,
    pub monitoring_status: String,
    pub device_count: i32,
}

/// Everything the dashboard page needs, scoped to one user.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: DashboardProfile,
    pub documents: Vec<Document>,
    pub billing: Vec<BillingRecord>,
}
