use crate::constants::{STATE_DIR_NAME, STATE_FILE_NAME, STATE_PATH_ENV};
use std::path::{Path, PathBuf};

/// Resolves where the state document lives.
///
/// Precedence: explicit override (CLI flag), `VOICE_POLISH_STATE_PATH`, the
/// platform application-support directory, then the current directory.
pub fn resolve_state_path(explicit: Option<&Path>) -> PathBuf {
  if let Some(path) = explicit {
    return path.to_path_buf();
  }

  if let Ok(path) = std::env::var(STATE_PATH_ENV) {
    let trimmed = path.trim();
    if !trimmed.is_empty() {
      return PathBuf::from(trimmed);
    }
  }

  let base = dirs::data_dir()
    .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
  base.join(STATE_DIR_NAME).join(STATE_FILE_NAME)
}

/// Sibling path used for the write-then-rename swap (`state.json` -> `state.tmp`).
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
  path.with_extension("tmp")
}
