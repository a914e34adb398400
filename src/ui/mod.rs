pub mod components;
pub mod dashboard;
pub mod clients;
pub mod client_wizard;
pub mod projects;
pub mod all_projects;
pub mod project_wizard;
pub mod settings_wizard;
