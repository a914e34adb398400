use chrono::{DateTime, NaiveDate, Utc};
use strum_macros::{Display, EnumString};

use super::{parse_variant, ModelError, Settings};
use crate::pricing::{self, PricingInput};

/// Selects how the base price of a project is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ProjectType {
    /// Billed per completed page
    #[default]
    Frontend,
    /// Fixed price scaled by completion percentage
    Backend,
    /// Fixed price scaled by completion percentage
    Fullstack,
}

impl ProjectType {
    pub const ALL: [ProjectType; 3] = [
        ProjectType::Frontend,
        ProjectType::Backend,
        ProjectType::Fullstack,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::Frontend => "Frontend",
            ProjectType::Backend => "Backend",
            ProjectType::Fullstack => "Full-Stack",
        }
    }

    pub fn is_page_priced(&self) -> bool {
        matches!(self, ProjectType::Frontend)
    }

    pub fn next(self) -> Self {
        match self {
            ProjectType::Frontend => ProjectType::Backend,
            ProjectType::Backend => ProjectType::Fullstack,
            ProjectType::Fullstack => ProjectType::Frontend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    OnHold,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::OnHold => "On Hold",
        }
    }

    /// Pending and in-progress projects count as active
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Pending | ProjectStatus::InProgress)
    }

    pub fn next(self) -> Self {
        match self {
            ProjectStatus::Pending => ProjectStatus::InProgress,
            ProjectStatus::InProgress => ProjectStatus::Completed,
            ProjectStatus::Completed => ProjectStatus::OnHold,
            ProjectStatus::OnHold => ProjectStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

/// Derived from paid vs. total amount, never set by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partially Paid",
            PaymentStatus::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i32,
    pub client_id: i32,
    pub name: String,
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    pub total_pages: Option<i32>,
    pub completed_pages: Option<i32>,
    pub price_per_page: Option<f64>,
    pub fixed_price: Option<f64>,
    pub completion_percentage: Option<i32>,
    pub extra_hours: f64,
    pub extra_hour_rate: f64,
    pub notes: String,
    pub share_token: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Priority,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Unsaved project for `client_id`, rates pre-filled from the settings
    pub fn draft(client_id: i32, settings: &Settings) -> Self {
        let now = Utc::now();
        let mut project = Self {
            id: 0,
            client_id,
            name: String::new(),
            project_type: ProjectType::default(),
            status: ProjectStatus::default(),
            total_pages: Some(0),
            completed_pages: Some(0),
            price_per_page: Some(settings.default_price_per_page),
            fixed_price: Some(settings.default_fixed_price),
            completion_percentage: Some(0),
            extra_hours: 0.0,
            extra_hour_rate: settings.default_extra_hour_rate,
            notes: String::new(),
            share_token: String::new(),
            total_amount: 0.0,
            paid_amount: 0.0,
            payment_status: PaymentStatus::Unpaid,
            start_date: None,
            deadline: None,
            category: None,
            priority: Priority::default(),
            estimated_hours: None,
            actual_hours: None,
            created_at: now,
            updated_at: now,
        };
        project.recompute();
        project
    }

    pub fn pricing_input(&self) -> PricingInput {
        PricingInput {
            project_type: self.project_type,
            total_pages: self.total_pages,
            completed_pages: self.completed_pages,
            price_per_page: self.price_per_page,
            fixed_price: self.fixed_price,
            completion_percentage: self.completion_percentage,
            extra_hours: self.extra_hours,
            extra_hour_rate: self.extra_hour_rate,
        }
    }

    /// Refresh `total_amount` and `payment_status` from the raw inputs
    pub fn recompute(&mut self) {
        let derived = pricing::derive(&self.pricing_input(), self.paid_amount);
        self.total_amount = derived.total_amount;
        self.payment_status = derived.payment_status;
    }

    pub fn progress(&self) -> f64 {
        pricing::calculate_progress(&self.pricing_input())
    }

    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        pricing::days_remaining(self.deadline, today)
    }

    /// Outstanding balance; negative when overpaid
    pub fn remaining_amount(&self) -> f64 {
        self.total_amount - self.paid_amount
    }
}

/// Project as stored in the `projects` table
#[derive(sqlx::FromRow, Debug)]
pub struct ProjectRow {
    pub id: i32,
    pub client_id: i32,
    pub name: String,
    pub project_type: String,
    pub status: String,
    pub total_pages: Option<i32>,
    pub completed_pages: Option<i32>,
    pub price_per_page: Option<f64>,
    pub fixed_price: Option<f64>,
    pub completion_percentage: Option<i32>,
    pub extra_hours: f64,
    pub extra_hour_rate: f64,
    pub notes: String,
    pub share_token: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub payment_status: String,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: String,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = ModelError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            name: row.name,
            project_type: parse_variant("project type", &row.project_type)?,
            status: parse_variant("project status", &row.status)?,
            total_pages: row.total_pages,
            completed_pages: row.completed_pages,
            price_per_page: row.price_per_page,
            fixed_price: row.fixed_price,
            completion_percentage: row.completion_percentage,
            extra_hours: row.extra_hours,
            extra_hour_rate: row.extra_hour_rate,
            notes: row.notes,
            share_token: row.share_token,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            payment_status: parse_variant("payment status", &row.payment_status)?,
            start_date: row.start_date,
            deadline: row.deadline,
            category: row.category,
            priority: parse_variant("priority", &row.priority)?,
            estimated_hours: row.estimated_hours,
            actual_hours: row.actual_hours,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            default_price_per_page: 300.0,
            default_extra_hour_rate: 120.0,
            default_fixed_price: 15000.0,
            ..Settings::default()
        }
    }

    #[test]
    fn draft_uses_default_rates_and_starts_unpaid() {
        let project = Project::draft(7, &settings());

        assert_eq!(project.client_id, 7);
        assert_eq!(project.price_per_page, Some(300.0));
        assert_eq!(project.fixed_price, Some(15000.0));
        assert_eq!(project.extra_hour_rate, 120.0);
        assert_eq!(project.total_amount, 0.0);
        assert_eq!(project.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn recompute_tracks_input_changes() {
        let mut project = Project::draft(1, &settings());
        project.total_pages = Some(10);
        project.completed_pages = Some(5);
        project.paid_amount = 500.0;
        project.recompute();

        assert_eq!(project.total_amount, 1500.0);
        assert_eq!(project.payment_status, PaymentStatus::Partial);
        assert_eq!(project.remaining_amount(), 1000.0);
        assert_eq!(project.progress(), 50.0);

        project.project_type = ProjectType::Backend;
        project.completion_percentage = Some(10);
        project.recompute();

        assert_eq!(project.total_amount, 1500.0);
        assert_eq!(project.payment_status, PaymentStatus::Partial);
        assert_eq!(project.progress(), 10.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut project = Project::draft(1, &settings());
        project.completed_pages = Some(3);
        project.paid_amount = 900.0;
        project.recompute();
        let once = project.clone();
        project.recompute();

        assert_eq!(project, once);
        assert_eq!(project.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn status_text_matches_store() {
        assert_eq!(ProjectStatus::InProgress.to_string(), "in-progress");
        assert_eq!("on-hold".parse::<ProjectStatus>(), Ok(ProjectStatus::OnHold));
        assert_eq!(ProjectType::Fullstack.to_string(), "fullstack");
        assert_eq!(PaymentStatus::Partial.to_string(), "partial");
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
    }

    #[test]
    fn cycling_returns_to_start() {
        let mut project_type = ProjectType::Frontend;
        for _ in 0..ProjectType::ALL.len() {
            project_type = project_type.next();
        }
        assert_eq!(project_type, ProjectType::Frontend);

        let mut status = ProjectStatus::Pending;
        for _ in 0..ProjectStatus::ALL.len() {
            status = status.next();
        }
        assert_eq!(status, ProjectStatus::Pending);
    }
}
