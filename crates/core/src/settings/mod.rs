//! Engine configuration.

mod settings_model;

pub use settings_model::LedgerSettings;
