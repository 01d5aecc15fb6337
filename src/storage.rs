use crate::config::atomic_rename;
use crate::model::{SaveFile, SAVE_VERSION};
use anyhow::Result;
use std::{fs, path::Path};

/// Read the save if it exists and parses; anything else means a fresh
/// tank. A corrupt or future-versioned file is never an error.
pub(crate) fn load_save(path: &Path) -> Option<SaveFile> {
    let s = fs::read_to_string(path).ok()?;
    let save = serde_json::from_str::<SaveFile>(&s).ok()?;
    if save.version != SAVE_VERSION {
        return None;
    }
    Some(save)
}

pub(crate) fn save_atomic(path: &Path, save: &SaveFile) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(save)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}
