//! `latchkey cards` - Credential store management

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use latchkey_controller::Config;
use latchkey_core::{Credential, CredentialId};
use latchkey_storage::{CredentialStore, FsStorage};
use tracing::warn;

#[derive(Args)]
pub struct CardsArgs {
    #[command(subcommand)]
    pub command: CardsCommand,
}

#[derive(Subcommand)]
pub enum CardsCommand {
    /// List stored credentials
    List,
    /// Add a credential, replacing any with the same id
    Add {
        /// Credential id, decimal or 0x-prefixed hex
        id: CredentialId,
        /// Display label
        #[arg(long)]
        label: Option<String>,
        /// Store the credential disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Remove a credential
    Remove {
        /// Credential id
        id: CredentialId,
    },
    /// Re-enable a disabled credential
    Enable {
        /// Credential id
        id: CredentialId,
    },
    /// Disable a credential without removing it
    Disable {
        /// Credential id
        id: CredentialId,
    },
}

pub fn handle(command: CardsCommand, config: &Config) -> Result<()> {
    let mut store = open_store(config)?;

    match command {
        CardsCommand::List => {
            if store.is_empty() {
                println!("No credentials");
            }
            for credential in store.iter() {
                println!("{credential}");
            }
        }

        CardsCommand::Add {
            id,
            label,
            disabled,
        } => {
            let mut credential = Credential::new(id).with_enabled(!disabled);
            if let Some(label) = label {
                credential = credential.with_label(label)?;
            }
            let shown = credential.to_string();
            let previous = store
                .upsert(credential)
                .context("failed to save credential")?;
            match previous {
                Some(_) => println!("Replaced {shown}"),
                None => println!("Added {shown}"),
            }
        }

        CardsCommand::Remove { id } => {
            match store.remove(id).context("failed to save credential store")? {
                Some(removed) => println!("Removed {removed}"),
                None => bail!("credential {id} not found"),
            }
        }

        CardsCommand::Enable { id } => set_enabled(&mut store, id, true)?,
        CardsCommand::Disable { id } => set_enabled(&mut store, id, false)?,
    }

    Ok(())
}

fn set_enabled(
    store: &mut CredentialStore<FsStorage>,
    id: CredentialId,
    enabled: bool,
) -> Result<()> {
    let found = store
        .set_enabled(id, enabled)
        .context("failed to save credential store")?;
    if !found {
        bail!("credential {id} not found");
    }
    println!("{} {id}", if enabled { "Enabled" } else { "Disabled" });
    Ok(())
}

pub(crate) fn open_store(config: &Config) -> Result<CredentialStore<FsStorage>> {
    let (store, fault) = config.storage.open_store().with_context(|| {
        format!(
            "failed to open credential store in {}",
            config.storage.data_dir.display()
        )
    })?;
    if let Some(fault) = fault {
        warn!(error = %fault, "Credential file was unreadable, moved aside and started empty");
    }
    Ok(store)
}
