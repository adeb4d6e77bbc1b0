use cap_std::{ambient_authority, fs_utf8::camino::Utf8PathBuf, fs_utf8::Dir};
use miette::{Context, IntoDiagnostic, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info};

pub const DATA_DIR_ENV: &str = "MAPMARK_DATA_DIR";

/// Mapmark data directory
/// We will read a path from env `MAPMARK_DATA_DIR` or create a folder at data_local_dir/mapmark, where data_local_dir is platform specific
/// Inside this directory, we store config files, scene layers, logs etc..
pub fn get_data_dir() -> Result<Dir> {
    let authoratah = ambient_authority();
    let dir = if let Ok(env_dir) = std::env::var(DATA_DIR_ENV) {
        let path = Utf8PathBuf::try_from(std::path::PathBuf::from(&env_dir))
            .into_diagnostic()
            .wrap_err(env_dir)
            .wrap_err("failed to parse MAPMARK_DATA_DIR")?;

        Dir::create_ambient_dir_all(&path, authoratah)
            .into_diagnostic()
            .wrap_err(path.clone())
            .wrap_err("failed to create mapmark directory")?;
        Dir::open_ambient_dir(&path, authoratah)
            .into_diagnostic()
            .wrap_err(path)
            .wrap_err("failed to open mapmark data dir")?
    } else {
        let dir = cap_directories::ProjectDirs::from("com.mapmark", "", "mapmark", authoratah)
            .ok_or(miette::miette!(
                "getting project dirs failed for some reason"
            ))?
            .data_local_dir()
            .into_diagnostic()
            .wrap_err("failed to get data local dir using capstd")?;
        Dir::from_cap_std(dir)
    };
    Ok(dir)
}

/// Reads `name` from `dir` and deserializes it.
/// If the file is missing or broken, we log it and use the default value instead.
/// The default is then written back to disk, so that users have a file to edit.
pub fn load_json_or_default<T: DeserializeOwned + Serialize + Default>(dir: &Dir, name: &str) -> T {
    let existing = if dir.exists(name) {
        match dir.read_to_string(name) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(value) => Some(value),
                Err(e) => {
                    error!(?e, name, "failed to deserialize json file");
                    None
                }
            },
            Err(e) => {
                error!(?e, name, "failed to read json file");
                None
            }
        }
    } else {
        info!(name, "json file doesn't exist yet");
        None
    };
    existing.unwrap_or_else(|| {
        let value = T::default();
        if let Err(e) = save_json(dir, name, &value) {
            debug!(?e, name, "failed to write default json to disk");
        }
        value
    })
}

pub fn save_json<T: Serialize>(dir: &Dir, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .into_diagnostic()
        .wrap_err("failed to serialize value")?;
    dir.write(name, json)
        .into_diagnostic()
        .wrap_err(name.to_string())
        .wrap_err("failed to write json file")?;
    Ok(())
}
