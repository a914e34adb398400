use anyhow::Result;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::db::Database;
use crate::format::{format_currency, format_date, format_days_remaining, progress_bar};
use crate::models::{Client, Project};
use crate::stats::{paid_percentage, ClientPortalStats};

#[derive(Debug, Error, PartialEq)]
pub enum PortalError {
    #[error("no client or project is shared under token `{0}`")]
    TokenNotFound(String),
}

/// What a share token grants read-only access to
#[derive(Debug, Clone)]
pub enum SharedView {
    Client { client: Client, projects: Vec<Project> },
    Project { project: Project, client: Client },
}

/// Link a client opens to follow a single project
pub fn project_share_url(base_url: &str, token: &str) -> String {
    format!("{}/share/{}", base_url.trim_end_matches('/'), token)
}

/// Link a client opens to see all of their projects
pub fn client_share_url(base_url: &str, token: &str) -> String {
    format!("{}/client/{}", base_url.trim_end_matches('/'), token)
}

/// Client tokens are checked before project tokens
pub async fn resolve(db: &Database, token: &str) -> Result<SharedView> {
    if let Some(client) = db.get_client_by_share_token(token).await? {
        let projects = db.get_projects_by_client(client.id).await?;
        return Ok(SharedView::Client { client, projects });
    }

    if let Some(project) = db.get_project_by_share_token(token).await? {
        let client = db.get_client(project.client_id).await?;
        return Ok(SharedView::Project { project, client });
    }

    Err(PortalError::TokenNotFound(token.to_string()).into())
}

/// Renders shared views as plain text and optionally writes them to disk
pub struct PortalReport {
    currency: String,
    company_name: String,
    today: NaiveDate,
}

impl PortalReport {
    pub fn new(currency: &str, company_name: &str, today: NaiveDate) -> Self {
        Self {
            currency: currency.to_string(),
            company_name: company_name.to_string(),
            today,
        }
    }

    pub fn render(&self, view: &SharedView) -> String {
        match view {
            SharedView::Client { client, projects } => self.render_client(client, projects),
            SharedView::Project { project, client } => self.render_project(project, client),
        }
    }

    /// Write the report into `output_dir`, creating it if needed
    pub fn write(&self, view: &SharedView, output_dir: &Path) -> Result<PathBuf> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let file_name = match view {
            SharedView::Client { client, .. } => format!("client_{}.txt", client.id),
            SharedView::Project { project, .. } => format!("project_{}.txt", project.id),
        };
        let path = output_dir.join(file_name);

        let mut file = File::create(&path)?;
        file.write_all(self.render(view).as_bytes())?;

        info!(path = %path.display(), "wrote portal report");
        Ok(path)
    }

    fn money(&self, amount: f64) -> String {
        format_currency(amount, &self.currency)
    }

    fn header(&self, content: &mut String, title: &str) {
        if !self.company_name.is_empty() {
            content.push_str(&format!("{}\n", self.company_name));
        }
        content.push_str(&format!("{}\n", title));
        content.push_str(&format!("{}\n\n", "=".repeat(title.chars().count())));
    }

    fn render_client(&self, client: &Client, projects: &[Project]) -> String {
        let mut content = String::new();
        self.header(&mut content, &format!("Projects for {}", client.name));

        let stats = ClientPortalStats::compute(projects);
        content.push_str(&format!(
            "Projects: {} total, {} active, {} completed\n",
            stats.total_projects, stats.active_projects, stats.completed_projects
        ));
        content.push_str(&format!("Total:    {}\n", self.money(stats.total_amount)));
        content.push_str(&format!("Paid:     {}\n", self.money(stats.paid_amount)));
        content.push_str(&format!("Pending:  {}\n", self.money(stats.pending_amount)));
        content.push_str(&format!("Payment:  {}% paid\n", stats.paid_percentage()));

        if projects.is_empty() {
            content.push_str("\nNo projects yet.\n");
            return content;
        }

        for project in projects {
            content.push('\n');
            self.project_lines(&mut content, project);
        }

        content
    }

    fn render_project(&self, project: &Project, client: &Client) -> String {
        let mut content = String::new();
        self.header(&mut content, &format!("{} ({})", project.name, client.name));
        self.project_lines(&mut content, project);

        if !project.notes.is_empty() {
            content.push_str(&format!("\nNotes:\n{}\n", project.notes));
        }

        content
    }

    fn project_lines(&self, content: &mut String, project: &Project) {
        content.push_str(&format!(
            "{} [{} | {} | {}]\n",
            project.name,
            project.project_type.label(),
            project.status.label(),
            project.priority.label()
        ));
        content.push_str(&format!("  Progress: {}\n", progress_bar(project.progress(), 20)));

        if project.project_type.is_page_priced() {
            content.push_str(&format!(
                "  Pages:    {} / {}\n",
                project.completed_pages.unwrap_or(0),
                project.total_pages.unwrap_or(0)
            ));
        }

        content.push_str(&format!(
            "  Amount:   {} (paid {}, {}%)\n",
            self.money(project.total_amount),
            self.money(project.paid_amount),
            paid_percentage(project.paid_amount, project.total_amount)
        ));
        if project.remaining_amount() > 0.0 {
            content.push_str(&format!("  Due:      {}\n", self.money(project.remaining_amount())));
        }
        content.push_str(&format!("  Payment:  {}\n", project.payment_status.label()));
        content.push_str(&format!(
            "  Dates:    {} to {} ({})\n",
            format_date(project.start_date),
            format_date(project.deadline),
            format_days_remaining(project.days_remaining(self.today))
        ));
    }
}
