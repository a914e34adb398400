mod config;
mod db;
mod format;
mod models;
mod portal;
mod pricing;
mod stats;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::config::Config;
use crate::db::StoreError;
use crate::format::format_currency;
use crate::models::Settings;
use crate::portal::{client_share_url, project_share_url, PortalReport};
use crate::stats::DashboardStats;
use crate::ui::{
    all_projects::{load_all_projects, render_all_projects, handle_input as handle_all_projects_input, AllProjectsAction, AllProjectsState},
    client_wizard::{render_client_wizard, handle_input as handle_client_wizard_input, ClientWizardAction, ClientWizardState},
    clients::{load_clients, render_clients, handle_input as handle_clients_input, ClientAction, ClientsState},
    dashboard::{load_stats, render_dashboard, handle_input as handle_dashboard_input, DashboardAction, DashboardState},
    project_wizard::{render_project_wizard, handle_input as handle_project_wizard_input, ProjectWizardAction, ProjectWizardState},
    projects::{load_projects_by_client, render_projects, handle_input as handle_projects_input, ProjectAction, ProjectsState},
    settings_wizard::{render_settings_wizard, handle_input as handle_settings_wizard_input, SettingsWizardAction, SettingsWizardState},
};

/// Track clients and projects, derive prices and payment state, share read-only links
#[derive(Parser)]
#[command(name = "freelance_manager", version)]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print dashboard statistics
    Summary,
    /// Show what a share token exposes
    Portal {
        token: String,
        /// Write the report to a directory (REPORT_DIR when no directory is given)
        #[arg(long)]
        output: Option<Option<PathBuf>>,
    },
}

// Project list the project wizard returns to
#[derive(Clone, Copy)]
enum ProjectList {
    Client(i32), // Contains client_id
    All,
}

// Represents the current screen in the app
enum AppScreen {
    Dashboard,
    Clients,
    ClientWizard,
    Projects(i32), // Contains client_id
    AllProjects,
    ProjectWizard(ProjectList),
    Settings,
}

// Main application state
struct AppState {
    db: db::Database,
    settings: Settings,
    portal_base_url: String,
    screen: AppScreen,
    dashboard_state: Option<DashboardState>,
    clients_state: Option<ClientsState>,
    client_wizard_state: Option<ClientWizardState>,
    projects_state: Option<ProjectsState>,
    all_projects_state: Option<AllProjectsState>,
    project_wizard_state: Option<ProjectWizardState>,
    settings_state: Option<SettingsWizardState>,
}

impl AppState {
    fn new(db: db::Database, settings: Settings, config: &Config) -> Self {
        Self {
            db,
            settings,
            portal_base_url: config.portal_base_url().to_string(),
            screen: AppScreen::Dashboard,
            dashboard_state: None,
            clients_state: None,
            client_wizard_state: None,
            projects_state: None,
            all_projects_state: None,
            project_wizard_state: None,
            settings_state: None,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init(cli.database_url)?;
    init_logging(&config)?;

    // Initialize database connection
    let db = db::init(&config).await?;
    let settings = db.load_settings().await?;

    match cli.command {
        Some(Command::Summary) => print_summary(&db, &settings).await,
        Some(Command::Portal { token, output }) => {
            print_portal(&db, &settings, &config, &token, output).await
        }
        None => run_tui(db, settings, &config).await,
    }
}

async fn print_summary(db: &db::Database, settings: &Settings) -> Result<()> {
    let projects = db.get_projects().await?;
    let stats = DashboardStats::compute(&projects, Utc::now());
    let money = |amount: f64| format_currency(amount, &settings.currency);

    println!("Projects:          {}", stats.total_projects);
    println!("Active:            {}", stats.active_projects);
    println!("Completed:         {}", stats.completed_projects);
    println!("Revenue:           {}", money(stats.total_revenue));
    println!("Pending payments:  {}", money(stats.pending_payments));
    println!("This month:        {}", money(stats.this_month_revenue));

    Ok(())
}

async fn print_portal(
    db: &db::Database,
    settings: &Settings,
    config: &Config,
    token: &str,
    output: Option<Option<PathBuf>>,
) -> Result<()> {
    let view = portal::resolve(db, token).await?;
    let report = PortalReport::new(&settings.currency, &settings.company_name, today());

    match output {
        Some(dir) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.report_dir));
            let path = report.write(&view, &dir)?;
            println!("Report written to {}", path.display());
        }
        None => print!("{}", report.render(&view)),
    }

    Ok(())
}

async fn run_tui(db: db::Database, settings: Settings, config: &Config) -> Result<()> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(db, settings, config);
    info!("starting freelance manager");

    let result = match load_dashboard_screen(&mut app_state).await {
        Ok(()) => run_app(&mut terminal, &mut app_state).await,
        Err(err) => Err(err),
    };

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "application stopped");
    }

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        // Render current screen
        terminal.draw(|f| match app_state.screen {
            AppScreen::Dashboard => {
                if let Some(state) = &app_state.dashboard_state {
                    render_dashboard(f, state);
                }
            }
            AppScreen::Clients => {
                if let Some(state) = &mut app_state.clients_state {
                    render_clients(f, state);
                }
            }
            AppScreen::ClientWizard => {
                if let Some(state) = &mut app_state.client_wizard_state {
                    render_client_wizard(f, state);
                }
            }
            AppScreen::Projects(_) => {
                if let Some(state) = &mut app_state.projects_state {
                    render_projects(f, state);
                }
            }
            AppScreen::AllProjects => {
                if let Some(state) = &mut app_state.all_projects_state {
                    render_all_projects(f, state);
                }
            }
            AppScreen::ProjectWizard(_) => {
                if let Some(state) = &mut app_state.project_wizard_state {
                    render_project_wizard(f, state);
                }
            }
            AppScreen::Settings => {
                if let Some(state) = &mut app_state.settings_state {
                    render_settings_wizard(f, state);
                }
            }
        })?;

        // Handle input for current screen
        let should_quit = match app_state.screen {
            AppScreen::Dashboard => handle_dashboard_screen(app_state).await?,
            AppScreen::Clients => handle_clients_screen(app_state).await?,
            AppScreen::ClientWizard => handle_client_wizard_screen(app_state).await?,
            AppScreen::Projects(client_id) => handle_projects_screen(app_state, client_id).await?,
            AppScreen::AllProjects => handle_all_projects_screen(app_state).await?,
            AppScreen::ProjectWizard(list) => handle_project_wizard_screen(app_state, list).await?,
            AppScreen::Settings => handle_settings_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

async fn load_dashboard_screen(app_state: &mut AppState) -> Result<()> {
    let stats = load_stats(&app_state.db).await?;
    app_state.dashboard_state = Some(DashboardState::new(stats, &app_state.settings.currency, today()));
    app_state.screen = AppScreen::Dashboard;

    Ok(())
}

/// Reload the client list, keeping the cursor on `focus` when given
async fn load_clients_screen(app_state: &mut AppState, focus: Option<i32>) -> Result<()> {
    let clients = load_clients(&app_state.db).await?;
    let mut state = ClientsState::new(clients);
    if let Some(client_id) = focus {
        state.select_client(client_id);
    }

    app_state.clients_state = Some(state);
    app_state.screen = AppScreen::Clients;

    Ok(())
}

async fn load_projects_screen(app_state: &mut AppState, client_id: i32, focus: Option<i32>) -> Result<()> {
    let client = app_state.db.get_client(client_id).await?;
    let projects = load_projects_by_client(&app_state.db, client_id).await?;
    let mut state = ProjectsState::new(
        client_id,
        client.name,
        projects,
        &app_state.settings.currency,
        today(),
    );
    if let Some(project_id) = focus {
        state.select_project(project_id);
    }

    app_state.projects_state = Some(state);
    app_state.screen = AppScreen::Projects(client_id);

    Ok(())
}

/// Reload every project, keeping the filters of the previous visit
async fn load_all_projects_screen(app_state: &mut AppState, focus: Option<i32>) -> Result<()> {
    let (projects, clients) = load_all_projects(&app_state.db).await?;
    let mut state = AllProjectsState::new(projects, &clients, &app_state.settings.currency, today());
    if let Some(previous) = app_state.all_projects_state.take() {
        state.restore_filter(previous.into_filter());
    }
    if let Some(project_id) = focus {
        state.select_project(project_id);
    }

    app_state.all_projects_state = Some(state);
    app_state.screen = AppScreen::AllProjects;

    Ok(())
}

async fn load_project_list(app_state: &mut AppState, list: ProjectList, focus: Option<i32>) -> Result<()> {
    match list {
        ProjectList::Client(client_id) => load_projects_screen(app_state, client_id, focus).await,
        ProjectList::All => load_all_projects_screen(app_state, focus).await,
    }
}

async fn open_project_editor(app_state: &mut AppState, project_id: i32, list: ProjectList) -> Result<()> {
    let project = app_state.db.get_project(project_id).await?;
    app_state.project_wizard_state = Some(ProjectWizardState::from_existing(
        project,
        &app_state.settings.currency,
        today(),
    ));
    app_state.screen = AppScreen::ProjectWizard(list);

    Ok(())
}

async fn handle_dashboard_screen(app_state: &mut AppState) -> Result<bool> {
    match handle_dashboard_input()? {
        Some(DashboardAction::Exit) => return Ok(true),
        Some(DashboardAction::OpenClients) => load_clients_screen(app_state, None).await?,
        Some(DashboardAction::OpenProjects) => {
            app_state.all_projects_state = None;
            load_all_projects_screen(app_state, None).await?;
        }
        Some(DashboardAction::OpenSettings) => {
            app_state.settings_state = Some(SettingsWizardState::from_existing(app_state.settings.clone()));
            app_state.screen = AppScreen::Settings;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_clients_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.clients_state {
        Some(state) => handle_clients_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(ClientAction::Back) => {
            load_dashboard_screen(app_state).await?;
        }
        Some(ClientAction::NewClient) => {
            app_state.client_wizard_state = Some(ClientWizardState::new());
            app_state.screen = AppScreen::ClientWizard;
        }
        Some(ClientAction::EditClient(client_id)) => {
            let client = app_state.db.get_client(client_id).await?;
            app_state.client_wizard_state = Some(ClientWizardState::from_existing(client));
            app_state.screen = AppScreen::ClientWizard;
        }
        Some(ClientAction::DeleteClient(client_id)) => match app_state.db.delete_client(client_id).await {
            Ok(()) => load_clients_screen(app_state, None).await?,
            Err(err) => {
                let Some(store_error) = err.downcast_ref::<StoreError>() else {
                    return Err(err);
                };
                let message = store_error.to_string();
                if let Some(state) = &mut app_state.clients_state {
                    state.set_error(message);
                }
            }
        },
        Some(ClientAction::SelectClient(client_id)) => {
            load_projects_screen(app_state, client_id, None).await?;
        }
        Some(ClientAction::ShareClient(client_id)) => {
            let client = app_state.db.get_client(client_id).await?;
            let url = client_share_url(&app_state.portal_base_url, &client.share_token);
            if let Some(state) = &mut app_state.clients_state {
                state.open_share_popup(url);
            }
        }
        Some(ClientAction::RegenerateShareToken(client_id)) => {
            let token = app_state.db.regenerate_client_share_token(client_id).await?;
            let url = client_share_url(&app_state.portal_base_url, &token);
            if let Some(state) = &mut app_state.clients_state {
                state.open_share_popup(url);
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_client_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.client_wizard_state {
        Some(state) => handle_client_wizard_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(ClientWizardAction::Cancel) => {
            load_clients_screen(app_state, None).await?;
        }
        Some(ClientWizardAction::Save(client)) => {
            let client_id = if client.id == 0 {
                app_state.db.create_client(&client).await?
            } else {
                app_state.db.update_client(&client).await?;
                client.id
            };

            app_state.client_wizard_state = None;
            load_clients_screen(app_state, Some(client_id)).await?;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_projects_screen(app_state: &mut AppState, client_id: i32) -> Result<bool> {
    let action = match &mut app_state.projects_state {
        Some(state) => handle_projects_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(ProjectAction::Back) => {
            load_clients_screen(app_state, Some(client_id)).await?;
        }
        Some(ProjectAction::NewProject(client_id)) => {
            app_state.project_wizard_state =
                Some(ProjectWizardState::new(client_id, &app_state.settings, today()));
            app_state.screen = AppScreen::ProjectWizard(ProjectList::Client(client_id));
        }
        Some(ProjectAction::EditProject(project_id)) => {
            open_project_editor(app_state, project_id, ProjectList::Client(client_id)).await?;
        }
        Some(ProjectAction::DeleteProject(project_id)) => {
            app_state.db.delete_project(project_id).await?;
            load_projects_screen(app_state, client_id, None).await?;
        }
        Some(ProjectAction::ShareProject(project_id)) => {
            let project = app_state.db.get_project(project_id).await?;
            let url = project_share_url(&app_state.portal_base_url, &project.share_token);
            if let Some(state) = &mut app_state.projects_state {
                state.open_share_popup(url);
            }
        }
        Some(ProjectAction::RegenerateShareToken(project_id)) => {
            let token = app_state.db.regenerate_project_share_token(project_id).await?;
            let url = project_share_url(&app_state.portal_base_url, &token);
            if let Some(state) = &mut app_state.projects_state {
                state.open_share_popup(url);
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_all_projects_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.all_projects_state {
        Some(state) => handle_all_projects_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(AllProjectsAction::Back) => {
            app_state.all_projects_state = None;
            load_dashboard_screen(app_state).await?;
        }
        Some(AllProjectsAction::EditProject(project_id)) => {
            open_project_editor(app_state, project_id, ProjectList::All).await?;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_project_wizard_screen(app_state: &mut AppState, list: ProjectList) -> Result<bool> {
    let action = match &mut app_state.project_wizard_state {
        Some(state) => handle_project_wizard_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(ProjectWizardAction::Cancel) => {
            app_state.project_wizard_state = None;
            load_project_list(app_state, list, None).await?;
        }
        Some(ProjectWizardAction::Save(project)) => {
            let project_id = if project.id == 0 {
                app_state.db.create_project(&project).await?
            } else {
                app_state.db.update_project(&project).await?;
                project.id
            };

            app_state.project_wizard_state = None;
            load_project_list(app_state, list, Some(project_id)).await?;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_settings_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.settings_state {
        Some(state) => handle_settings_wizard_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(SettingsWizardAction::Cancel) => {
            load_dashboard_screen(app_state).await?;
        }
        Some(SettingsWizardAction::Save(settings)) => {
            app_state.db.save_settings(&settings).await?;
            app_state.settings = settings;
            app_state.settings_state = None;
            load_dashboard_screen(app_state).await?;
        }
        None => {}
    }

    Ok(false)
}
