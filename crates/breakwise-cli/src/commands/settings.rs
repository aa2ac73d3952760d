use breakwise_core::{App, Config, Settings};
use clap::Subcommand;
use serde_json::Value;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting (e.g. "intervalMinutes", "smartMode")
    Get {
        /// Setting key
        key: String,
    },
    /// Set a setting
    Set {
        /// Setting key
        key: String,
        /// New value, as JSON (plain text is taken as a string)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: SettingsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open(config)?;

    match action {
        SettingsAction::Get { key } => {
            let settings = serde_json::to_value(app.settings())?;
            match settings.get(&key) {
                Some(Value::String(s)) => println!("{s}"),
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown setting: {key}").into()),
            }
        }
        SettingsAction::Set { key, value } => {
            let updated = with_value(app.settings(), &key, &value)?;
            app.save_settings(updated);
            println!("ok");
        }
        SettingsAction::List => {
            println!("{}", serde_json::to_string_pretty(app.settings())?);
        }
        SettingsAction::Reset => {
            app.reset_settings();
            println!("settings reset to defaults");
        }
    }
    Ok(())
}

/// Copy of `settings` with `key` replaced.
fn with_value(
    settings: &Settings,
    key: &str,
    raw: &str,
) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut json = serde_json::to_value(settings)?;
    let slot = json
        .get_mut(key)
        .ok_or_else(|| format!("unknown setting: {key}"))?;
    *slot = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    serde_json::from_value(json).map_err(|e| format!("invalid value for {key}: {e}").into())
}
