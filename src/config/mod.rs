/// Database connection and table creation
pub mod database;

/// Seed group definitions loaded from config.toml
pub mod groups;

/// Runtime settings loaded from environment variables
pub mod settings;
