/* ****************************************************************** **
**  This file is part of asgrid.                                      **
**                                                                    **
**  asgrid is free software: you can redistribute it and/or modify it **
**  under the terms of the GNU General Public License as published by **
**  the Free Software Foundation, either version 3 of the License, or **
**  (at your option) any later version.                               **
**                                                                    **
**      http://www.gnu.org/licenses/                                  **
**                                                                    **
** Do note that, while the whole of asgrid is licensed under the GPL, **
** many parts of it are licensed under more permissive terms.         **
** ****************************************************************** */

//! Trial directories.
//!
//! A trial directory holds everything about one run of a sweep: how it was
//! invoked, the effective settings, the log and the summary.

use crate::FailResult;
use crate::traits::{Save, Json, Yaml};
use crate::ui::cfg_merging::ConfigSources;

use asgrid_tasks_config::{ValidatedSettings, YamlRead};

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

pub const LOCKFILE: &str = "asgrid.lock";
pub const LOGFILE: &str = "asgrid.log";
pub const SETTINGS_FILE: &str = "settings.yaml";
pub const SUMMARY_FILE: &str = "summary.json";

pub struct NewTrialDirArgs {
    /// `None` lets the settings pick a directory.
    pub trial_dir: Option<PathBuf>,
    pub config_sources: ConfigSources,
    pub err_if_existing: bool,
}

/// A trial directory that this process holds the lock for.
#[derive(Debug)]
pub struct TrialDir {
    path: PathBuf,
    _lock: LockfileGuard,
}

impl TrialDir {
    /// Read the merged config, then create and lock the trial directory and
    /// record the inputs in it.
    ///
    /// Without an explicit directory, the trial goes in `results/{model}/{folder}`.
    pub fn create_new(args: NewTrialDirArgs) -> FailResult<(TrialDir, ValidatedSettings)> {
        let NewTrialDirArgs { trial_dir, config_sources, err_if_existing } = args;

        let config = config_sources.effective_yaml();
        let settings = ValidatedSettings::from_value(config.clone())?;

        let trial_dir = trial_dir.unwrap_or_else(|| {
            Path::new("results").join(&settings.model).join(settings.results_folder_name())
        });
        if trial_dir.exists() {
            if err_if_existing {
                bail!("{}: already exists (use --force to replace it)", trial_dir.display());
            }
            asgrid_fs_util::rm_rf(&trial_dir)?;
        }
        asgrid_fs_util::create_dir_all(&trial_dir)?;
        let path = asgrid_fs_util::canonicalize(&trial_dir)?;

        // Obtain a lock before writing anything to the directory.
        let lock = match LockfileGuard::try_lock(path.join(LOCKFILE))? {
            None => bail!("the lockfile was stolen from under our feet!"),
            Some(g) => g,
        };
        let trial = TrialDir { path, _lock: lock };

        // These are solely for the user's benefit.
        let args_file: Vec<_> = std::env::args().collect();
        Json(args_file).save(trial.join("input-cli-args.json"))?;
        Yaml(&config_sources).save(trial.join("input-config-sources.yaml"))?;

        // ...but this one is read back.
        Yaml(&config).save(trial.settings_path())?;
        let settings = trial.read_settings()?;
        Ok((trial, settings))
    }

    pub fn path(&self) -> &Path
    { &self.path }

    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf
    { self.path.join(path) }

    pub fn logfile_path(&self) -> PathBuf
    { self.join(LOGFILE) }

    pub fn settings_path(&self) -> PathBuf
    { self.join(SETTINGS_FILE) }

    pub fn summary_path(&self) -> PathBuf
    { self.join(SUMMARY_FILE) }

    pub fn read_settings<T: YamlRead>(&self) -> FailResult<T> {
        let text = asgrid_fs_util::read_to_string(self.settings_path())?;
        YamlRead::from_str(&text)
    }
}

/// RAII guard for a lockfile.
#[derive(Debug)]
pub struct LockfileGuard(PathBuf);

impl LockfileGuard {
    /// `None` if someone else holds the lock.
    pub fn try_lock(path: impl AsRef<Path>) -> FailResult<Option<LockfileGuard>> {
        let path = path.as_ref();
        // 'create_new' is the magic sauce for avoiding race conditions
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Some(LockfileGuard(path.to_owned()))),
            Err(e) => match e.kind() {
                io::ErrorKind::AlreadyExists => Ok(None),
                _ => bail!("{}: could not create lockfile: {}", path.display(), e),
            },
        }
    }
}

impl Drop for LockfileGuard {
    fn drop(&mut self) {
        let _ = asgrid_fs_util::remove_file(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &Path, configs: &[&str], err_if_existing: bool) -> NewTrialDirArgs {
        NewTrialDirArgs {
            trial_dir: Some(dir.to_owned()),
            config_sources: ConfigSources::resolve_from_args(configs).unwrap(),
            err_if_existing,
        }
    }

    #[test]
    fn creates_inputs_and_holds_the_lock() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-trial").unwrap();
        let dir = tmp.path().join("trial");
        let (trial, settings) = TrialDir::create_new(args(&dir, &["model: exp3D"], true)).unwrap();

        assert_eq!(settings.model, "exp3D");
        for name in &[LOCKFILE, SETTINGS_FILE, "input-cli-args.json", "input-config-sources.yaml"] {
            assert!(trial.join(name).exists(), "{}", name);
        }
        assert!(LockfileGuard::try_lock(trial.join(LOCKFILE)).unwrap().is_none());

        drop(trial);
        assert!(!dir.join(LOCKFILE).exists());
    }

    #[test]
    fn existing_directories_need_force() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-trial").unwrap();
        let dir = tmp.path().join("trial");
        drop(TrialDir::create_new(args(&dir, &[], true)).unwrap());

        assert!(TrialDir::create_new(args(&dir, &[], true)).is_err());
        let (_, settings) = TrialDir::create_new(args(&dir, &["seed: 3"], false)).unwrap();
        assert_eq!(settings.seed, 3);
    }

    #[test]
    fn invalid_settings_create_nothing() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-trial").unwrap();
        let dir = tmp.path().join("trial");
        assert!(TrialDir::create_new(args(&dir, &["min-points: 1000"], true)).is_err());
        assert!(!dir.exists());
    }
}
