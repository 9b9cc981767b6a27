use crate::output::Output;
use cinemarec_config::{CredentialStore, PathManager};
use cinemarec_core::Authenticator;
use color_eyre::Result;
use std::fs;

pub fn run_clear(all: bool, session: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if all {
        clear_credentials(&path_manager, output)?;
        return Ok(());
    }

    if session {
        clear_session(&path_manager, output)?;
        return Ok(());
    }

    output.warn("No clear option specified. Use --session or --all");
    output.println("\nExample: cinemarec clear --session");
    Ok(())
}

fn clear_session(path_manager: &PathManager, output: &Output) -> Result<()> {
    if !path_manager.credentials_file().exists() {
        output.info("No credentials file found, nothing to clear");
        return Ok(());
    }

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;

    if cred_store.get_session_token().is_none() && cred_store.get_return_to().is_none() {
        output.info("No cached session found to clear");
        return Ok(());
    }

    // The pending route is dropped too; logout persists both
    cred_store.take_return_to();
    Authenticator::logout(&mut cred_store)?;
    output.success("Cleared cached session");
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();

    if credentials_file.exists() {
        fs::remove_file(&credentials_file).map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to remove credentials file at {}: {}",
                credentials_file.display(),
                e
            )
        })?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }

    Ok(())
}
