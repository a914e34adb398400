//! Aggregates for the dashboard and the client portal.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::models::{PaymentStatus, Project, ProjectStatus, ProjectType};

const RECENT_PROJECTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_revenue: f64,
    pub pending_payments: f64,
    pub this_month_revenue: f64,
    pub projects_by_status: HashMap<ProjectStatus, usize>,
    pub projects_by_type: HashMap<ProjectType, usize>,
    pub recent_projects: Vec<Project>,
}

impl DashboardStats {
    /// `now` decides which calendar month counts as "this month"
    pub fn compute(projects: &[Project], now: DateTime<Utc>) -> Self {
        let mut projects_by_status: HashMap<ProjectStatus, usize> =
            ProjectStatus::ALL.iter().map(|status| (*status, 0)).collect();
        let mut projects_by_type: HashMap<ProjectType, usize> =
            ProjectType::ALL.iter().map(|project_type| (*project_type, 0)).collect();

        for project in projects {
            *projects_by_status.entry(project.status).or_default() += 1;
            *projects_by_type.entry(project.project_type).or_default() += 1;
        }

        let this_month_revenue = projects
            .iter()
            .filter(|p| p.updated_at.year() == now.year() && p.updated_at.month() == now.month())
            .map(|p| p.paid_amount)
            .sum();

        let pending_payments = projects
            .iter()
            .filter(|p| p.payment_status != PaymentStatus::Paid)
            .map(Project::remaining_amount)
            .sum();

        let mut recent_projects = projects.to_vec();
        recent_projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_projects.truncate(RECENT_PROJECTS);

        Self {
            total_projects: projects.len(),
            active_projects: projects.iter().filter(|p| p.status.is_active()).count(),
            completed_projects: count_status(projects, ProjectStatus::Completed),
            total_revenue: projects.iter().map(|p| p.paid_amount).sum(),
            pending_payments,
            this_month_revenue,
            projects_by_status,
            projects_by_type,
            recent_projects,
        }
    }
}

/// Totals shown on a client's read-only portal
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPortalStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub pending_amount: f64,
}

impl ClientPortalStats {
    pub fn compute(projects: &[Project]) -> Self {
        let total_amount: f64 = projects.iter().map(|p| p.total_amount).sum();
        let paid_amount: f64 = projects.iter().map(|p| p.paid_amount).sum();

        Self {
            total_projects: projects.len(),
            active_projects: projects.iter().filter(|p| p.status.is_active()).count(),
            completed_projects: count_status(projects, ProjectStatus::Completed),
            total_amount,
            paid_amount,
            pending_amount: total_amount - paid_amount,
        }
    }

    /// Share of the total already paid, in whole percent
    pub fn paid_percentage(&self) -> i64 {
        paid_percentage(self.paid_amount, self.total_amount)
    }
}

/// `paid / total` in whole percent, 0 when nothing is billable
pub fn paid_percentage(paid_amount: f64, total_amount: f64) -> i64 {
    if total_amount > 0.0 {
        (paid_amount / total_amount * 100.0).round() as i64
    } else {
        0
    }
}

fn count_status(projects: &[Project], status: ProjectStatus) -> usize {
    projects.iter().filter(|p| p.status == status).count()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::Settings;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn project(
        id: i32,
        status: ProjectStatus,
        completed_pages: i32,
        paid: f64,
        created: DateTime<Utc>,
    ) -> Project {
        let mut project = Project::draft(1, &Settings::default());
        project.id = id;
        project.status = status;
        project.total_pages = Some(10);
        project.completed_pages = Some(completed_pages);
        project.price_per_page = Some(100.0);
        project.paid_amount = paid;
        project.created_at = created;
        project.updated_at = created;
        project.recompute();
        project
    }

    fn sample() -> Vec<Project> {
        vec![
            project(1, ProjectStatus::Pending, 2, 0.0, at(2024, 1, 5)),
            project(2, ProjectStatus::InProgress, 5, 200.0, at(2024, 2, 10)),
            project(3, ProjectStatus::Completed, 10, 1000.0, at(2024, 3, 1)),
            project(4, ProjectStatus::OnHold, 4, 100.0, at(2024, 3, 20)),
        ]
    }

    #[test]
    fn dashboard_counts_and_sums() {
        let stats = DashboardStats::compute(&sample(), at(2024, 3, 25));

        assert_eq!(stats.total_projects, 4);
        assert_eq!(stats.active_projects, 2);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.total_revenue, 1300.0);
        // unpaid 200 + partial 300 + partial 300; the paid project is excluded
        assert_eq!(stats.pending_payments, 800.0);
        assert_eq!(stats.this_month_revenue, 1100.0);
        assert_eq!(stats.projects_by_status[&ProjectStatus::OnHold], 1);
        assert_eq!(stats.projects_by_type[&ProjectType::Frontend], 4);
        assert_eq!(stats.projects_by_type[&ProjectType::Backend], 0);
    }

    #[test]
    fn recent_projects_are_newest_first_and_capped() {
        let mut projects = sample();
        projects.push(project(5, ProjectStatus::Pending, 0, 0.0, at(2024, 4, 1)));
        projects.push(project(6, ProjectStatus::Pending, 0, 0.0, at(2023, 12, 1)));

        let stats = DashboardStats::compute(&projects, at(2024, 4, 2));
        let ids: Vec<i32> = stats.recent_projects.iter().map(|p| p.id).collect();

        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn empty_dashboard_is_all_zero() {
        let stats = DashboardStats::compute(&[], at(2024, 1, 1));

        assert_eq!(stats.total_projects, 0);
        assert_eq!(stats.pending_payments, 0.0);
        assert!(stats.recent_projects.is_empty());
    }

    #[test]
    fn client_portal_totals() {
        let stats = ClientPortalStats::compute(&sample());

        assert_eq!(stats.total_amount, 2100.0);
        assert_eq!(stats.paid_amount, 1300.0);
        assert_eq!(stats.pending_amount, 800.0);
        assert_eq!(stats.paid_percentage(), 62);
    }

    #[test]
    fn paid_percentage_without_total_is_zero() {
        assert_eq!(paid_percentage(0.0, 0.0), 0);
        assert_eq!(paid_percentage(50.0, 0.0), 0);
        assert_eq!(paid_percentage(50.0, 200.0), 25);
    }
}
