use std::path::{Path, PathBuf};

/// Environment variable naming the dataset to open at startup.
pub const DATA_ENV: &str = "AQ_DASHBOARD_DATA";

/// File looked for in the working directory when nothing else is given.
pub const DEFAULT_DATA_FILE: &str = "all_data.csv";

/// Dataset to open at startup: first argument, then `AQ_DASHBOARD_DATA`,
/// then `all_data.csv` if it exists.
pub fn startup_data_path() -> Option<PathBuf> {
    resolve_data_path(
        std::env::args_os().nth(1).map(PathBuf::from),
        std::env::var_os(DATA_ENV).map(PathBuf::from),
        Path::new(DEFAULT_DATA_FILE),
    )
}

fn resolve_data_path(
    arg: Option<PathBuf>,
    env: Option<PathBuf>,
    default: &Path,
) -> Option<PathBuf> {
    arg.or(env)
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| default.exists().then(|| default.to_path_buf()))
}
