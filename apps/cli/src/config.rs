use anyhow::Context;
use eventplan_core::settings::LedgerSettings;

pub struct Config {
    pub settings: LedgerSettings,
    /// Stop at the first step that fails unexpectedly.
    pub fail_fast: bool,
}

fn env_flag(name: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("Invalid {}: '{}'", name, other),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = LedgerSettings::default();
        let settings = LedgerSettings {
            base_currency: std::env::var("EP_BASE_CURRENCY")
                .unwrap_or(defaults.base_currency)
                .trim()
                .to_uppercase(),
            reject_budget_overpayment: env_flag(
                "EP_REJECT_OVERPAYMENT",
                defaults.reject_budget_overpayment,
            )?,
            auto_advance_on_deposit: env_flag(
                "EP_AUTO_ADVANCE_DEPOSIT",
                defaults.auto_advance_on_deposit,
            )?,
        };
        settings
            .validate()
            .context("Invalid EP_BASE_CURRENCY")?;
        Ok(Self {
            settings,
            fail_fast: env_flag("EP_FAIL_FAST", false)?,
        })
    }
}
