use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Environment variable naming the optional overlay file (`local` -> `local.yaml`).
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Load settings from `<dir>/base.yaml`, the optional `<dir>/<APP_ENVIRONMENT>.yaml`
/// overlay, then `APP_*` environment variables (`__` separates nested keys).
pub fn load_layered<T: DeserializeOwned>(dir: &Path) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let environment = std::env::var(ENVIRONMENT_VAR).ok();
    load_from(dir, environment.as_deref())
}

pub fn load_from<T: DeserializeOwned>(dir: &Path, environment: Option<&str>) -> Result<T, AppError> {
    let mut builder = Cfg::builder().add_source(File::from(dir.join("base.yaml")).required(true));

    if let Some(environment) = environment {
        builder = builder
            .add_source(File::from(dir.join(format!("{}.yaml", environment))).required(false));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
