use crate::intent::Intent;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Load and parse an intent document from a JSON file
pub fn load_intent(intent_path: &Path) -> Result<Intent> {
    info!("Loading intent from: {:?}", intent_path);

    let file = File::open(intent_path)
        .wrap_err_with(|| format!("Failed to open intent file '{}'", intent_path.display()))?;

    let intent: Intent = serde_json::from_reader(BufReader::new(file))
        .wrap_err_with(|| format!("Failed to parse intent file '{}'", intent_path.display()))?;

    if intent.autonomous_systems.is_empty() {
        warn!("Intent file {:?} declares no autonomous systems", intent_path);
    }

    Ok(intent)
}

/// Write an intent document as pretty-printed JSON
pub fn save_intent(intent: &Intent, path: &Path) -> Result<()> {
    let mut content = serde_json::to_string_pretty(intent)?;
    content.push('\n');
    std::fs::write(path, content)
        .wrap_err_with(|| format!("Failed to write intent file '{}'", path.display()))?;
    info!("Wrote filled intent to: {:?}", path);
    Ok(())
}

/// Default location of the filled intent: `net.json` becomes `net_filled.json`
/// next to the original.
pub fn filled_intent_path(intent_path: &Path) -> PathBuf {
    let stem = intent_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "intent".to_string());
    intent_path.with_file_name(format!("{}_filled.json", stem))
}
