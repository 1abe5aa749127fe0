use std::path::Path;

pub fn open_url(url: &str) -> Result<(), String> {
    open::that(url).map_err(|e| format!("Failed to open URL: {}", e))?;
    log::info!("Opened {} in the default browser", url);
    Ok(())
}

pub fn open_path(path: &Path) -> Result<(), String> {
    open::that(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    log::info!("Opened {}", path.display());
    Ok(())
}
