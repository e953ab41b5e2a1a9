use std::path::{Path, PathBuf};

use crate::db::Database;

pub const DEFAULT_DATA_PATH: &str = "data/jobs.json";

/// Where jobdash reads postings, keeps bookmarks and writes exports.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub store_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Config {
    /// Fills in defaults for anything not given on the command line or in
    /// the environment.
    pub fn resolve(
        data: Option<PathBuf>,
        store: Option<PathBuf>,
        export_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            data_path: data
                .map(|p| expand_home(&p))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            store_path: store
                .map(|p| expand_home(&p))
                .unwrap_or_else(Database::default_path),
            export_dir: export_dir
                .map(|p| expand_home(&p))
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

// Expand ~ in path
fn expand_home(path: &Path) -> PathBuf {
    match path.to_str().and_then(|p| p.strip_prefix("~/")) {
        Some(rest) => match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(rest),
            Err(_) => path.to_path_buf(),
        },
        None => path.to_path_buf(),
    }
}
