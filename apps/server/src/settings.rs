use std::env;

/// Runtime settings, read from the environment with build-time `.env` defaults
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub port: u16,
    pub database_path: String,
    pub pool_size: usize,
}

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

fn get_env_var<T: std::str::FromStr>(name: &str, baked: Option<&'static str>, default: T) -> T {
    env::var(name)
        .ok()
        .or_else(|| baked.map(str::to_string))
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind: get_env_var("BIND", option_env!("BIND"), DEFAULT_BIND.to_string()),
            port: get_env_var("PORT", option_env!("PORT"), DEFAULT_PORT),
            database_path: get_env_var(
                "PULSEWATCH_DATABASE",
                option_env!("PULSEWATCH_DATABASE"),
                "pulsewatch.db".to_string(),
            ),
            pool_size: get_env_var("PULSEWATCH_POOL_SIZE", option_env!("PULSEWATCH_POOL_SIZE"), 8),
        }
    }
}
