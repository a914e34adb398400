use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Client, ClientRow, Project, ProjectRow, Settings};

/// Store failures that callers are expected to handle rather than abort on
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("client {client_id} still has {count} project(s) and cannot be deleted")]
    ClientHasProjects { client_id: i32, count: i64 },
}

/// Opaque 32 character hex token used in share links
pub fn generate_share_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    // Client operations
    pub async fn get_clients(&self) -> Result<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(
            "SELECT * FROM clients ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.get_pool())
        .await?;

        let clients = rows
            .into_iter()
            .map(Client::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    pub async fn get_client(&self, id: i32) -> Result<Client> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_one(self.get_pool())
            .await?;

        Ok(Client::try_from(row)?)
    }

    pub async fn get_client_by_share_token(&self, token: &str) -> Result<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE share_token = $1")
            .bind(token)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(row.map(Client::try_from).transpose()?)
    }

    pub async fn create_client(&self, client: &Client) -> Result<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO clients (name, client_type, email, phone, company, notes, tags, share_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&client.name)
        .bind(client.client_type.to_string())
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.company)
        .bind(&client.notes)
        .bind(&client.tags)
        .bind(generate_share_token())
        .fetch_one(self.get_pool())
        .await?;

        info!(client_id = id, name = %client.name, "created client");
        Ok(id)
    }

    pub async fn update_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE clients
            SET name = $1, client_type = $2, email = $3, phone = $4,
                company = $5, notes = $6, tags = $7
            WHERE id = $8
            "#,
        )
        .bind(&client.name)
        .bind(client.client_type.to_string())
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.company)
        .bind(&client.notes)
        .bind(&client.tags)
        .bind(client.id)
        .execute(self.get_pool())
        .await?;

        info!(client_id = client.id, "updated client");
        Ok(())
    }

    pub async fn count_projects_for_client(&self, client_id: i32) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(count)
    }

    /// Deletes a client that owns no projects
    ///
    /// Fails with [`StoreError::ClientHasProjects`] otherwise.
    pub async fn delete_client(&self, id: i32) -> Result<()> {
        let count = self.count_projects_for_client(id).await?;
        if count > 0 {
            warn!(client_id = id, count, "refusing to delete client with projects");
            return Err(StoreError::ClientHasProjects { client_id: id, count }.into());
        }

        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        info!(client_id = id, "deleted client");
        Ok(())
    }

    pub async fn regenerate_client_share_token(&self, id: i32) -> Result<String> {
        let token = generate_share_token();
        sqlx::query("UPDATE clients SET share_token = $1 WHERE id = $2")
            .bind(&token)
            .bind(id)
            .execute(self.get_pool())
            .await?;

        info!(client_id = id, "regenerated client share token");
        Ok(token)
    }

    // Project operations
    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.get_pool())
        .await?;

        into_projects(rows)
    }

    pub async fn get_projects_by_client(&self, client_id: i32) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE client_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(client_id)
        .fetch_all(self.get_pool())
        .await?;

        into_projects(rows)
    }

    pub async fn get_project(&self, id: i32) -> Result<Project> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_one(self.get_pool())
            .await?;

        Ok(Project::try_from(row)?)
    }

    pub async fn get_project_by_share_token(&self, token: &str) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE share_token = $1")
            .bind(token)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(row.map(Project::try_from).transpose()?)
    }

    /// Inserts the project with freshly derived amounts and a new share token
    pub async fn create_project(&self, project: &Project) -> Result<i32> {
        let mut project = project.clone();
        project.recompute();

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO projects (
                client_id, name, project_type, status, total_pages, completed_pages,
                price_per_page, fixed_price, completion_percentage, extra_hours,
                extra_hour_rate, notes, share_token, total_amount, paid_amount,
                payment_status, start_date, deadline, category, priority,
                estimated_hours, actual_hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22)
            RETURNING id
            "#,
        )
        .bind(project.client_id)
        .bind(&project.name)
        .bind(project.project_type.to_string())
        .bind(project.status.to_string())
        .bind(project.total_pages)
        .bind(project.completed_pages)
        .bind(project.price_per_page)
        .bind(project.fixed_price)
        .bind(project.completion_percentage)
        .bind(project.extra_hours)
        .bind(project.extra_hour_rate)
        .bind(&project.notes)
        .bind(generate_share_token())
        .bind(project.total_amount)
        .bind(project.paid_amount)
        .bind(project.payment_status.to_string())
        .bind(project.start_date)
        .bind(project.deadline)
        .bind(&project.category)
        .bind(project.priority.to_string())
        .bind(project.estimated_hours)
        .bind(project.actual_hours)
        .fetch_one(self.get_pool())
        .await?;

        info!(
            project_id = id,
            client_id = project.client_id,
            total_amount = project.total_amount,
            payment_status = %project.payment_status,
            "created project"
        );
        Ok(id)
    }

    /// Updates the project with freshly derived amounts and bumps `updated_at`
    pub async fn update_project(&self, project: &Project) -> Result<()> {
        let mut project = project.clone();
        project.recompute();

        sqlx::query(
            r#"
            UPDATE projects
            SET client_id = $1, name = $2, project_type = $3, status = $4,
                total_pages = $5, completed_pages = $6, price_per_page = $7,
                fixed_price = $8, completion_percentage = $9, extra_hours = $10,
                extra_hour_rate = $11, notes = $12, total_amount = $13,
                paid_amount = $14, payment_status = $15, start_date = $16,
                deadline = $17, category = $18, priority = $19,
                estimated_hours = $20, actual_hours = $21, updated_at = now()
            WHERE id = $22
            "#,
        )
        .bind(project.client_id)
        .bind(&project.name)
        .bind(project.project_type.to_string())
        .bind(project.status.to_string())
        .bind(project.total_pages)
        .bind(project.completed_pages)
        .bind(project.price_per_page)
        .bind(project.fixed_price)
        .bind(project.completion_percentage)
        .bind(project.extra_hours)
        .bind(project.extra_hour_rate)
        .bind(&project.notes)
        .bind(project.total_amount)
        .bind(project.paid_amount)
        .bind(project.payment_status.to_string())
        .bind(project.start_date)
        .bind(project.deadline)
        .bind(&project.category)
        .bind(project.priority.to_string())
        .bind(project.estimated_hours)
        .bind(project.actual_hours)
        .bind(project.id)
        .execute(self.get_pool())
        .await?;

        info!(
            project_id = project.id,
            total_amount = project.total_amount,
            payment_status = %project.payment_status,
            "updated project"
        );
        Ok(())
    }

    pub async fn delete_project(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        info!(project_id = id, "deleted project");
        Ok(())
    }

    pub async fn regenerate_project_share_token(&self, id: i32) -> Result<String> {
        let token = generate_share_token();
        sqlx::query("UPDATE projects SET share_token = $1 WHERE id = $2")
            .bind(&token)
            .bind(id)
            .execute(self.get_pool())
            .await?;

        info!(project_id = id, "regenerated project share token");
        Ok(token)
    }

    // Settings operations
    pub async fn load_settings(&self) -> Result<Settings> {
        let pairs = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM settings")
            .fetch_all(self.get_pool())
            .await?;

        debug!(count = pairs.len(), "loaded settings");
        Ok(Settings::from_pairs(pairs))
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in settings.to_pairs() {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value) VALUES ($1, $2)
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!("saved settings");
        Ok(())
    }
}

fn into_projects(rows: Vec<ProjectRow>) -> Result<Vec<Project>> {
    let projects = rows
        .into_iter()
        .map(Project::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(projects)
}

/// Initialize the database connection pool and bring the schema up to date
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    sqlx::migrate!().run(db.get_pool()).await?;
    info!("database migrations applied");

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_tokens_are_32_hex_chars() {
        let token = generate_share_token();

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn share_tokens_differ() {
        assert_ne!(generate_share_token(), generate_share_token());
    }

    #[test]
    fn client_with_projects_error_names_the_count() {
        let err = StoreError::ClientHasProjects { client_id: 4, count: 2 };

        assert_eq!(
            err.to_string(),
            "client 4 still has 2 project(s) and cannot be deleted"
        );
    }
}
