//! `xianwallet`: inspect and manage the Xian wallet secure store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::{bail, eyre, Result, WrapErr};
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use xianwallet_secure_store::{
    export_portable, import_portable, read_backup_file, write_backup_file, Capabilities,
    FormatTag, SecretRecord, StoreConfig, WalletStore,
};

#[derive(Debug, Parser)]
#[command(name = "xianwallet", version, about = "Xian wallet secure store tool")]
struct Cli {
    /// Root directory holding `XianWallet/`. Defaults to the per-user data directory.
    #[arg(long, env = "XIANWALLET_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Store password, needed only where no vault or native service exists.
    #[arg(long, env = "XIANWALLET_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the store location, format and platform capabilities.
    Status,
    /// Encrypt and persist a wallet, replacing any stored one.
    Save {
        #[arg(long)]
        private_key: String,
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        mnemonic: Option<String>,
        #[arg(long)]
        node_url: Option<String>,
    },
    /// Load and print the stored wallet.
    Show {
        /// Also print the private key and mnemonic.
        #[arg(long)]
        reveal: bool,
    },
    /// Delete the store file.
    Clear,
    /// Write a portable backup of the stored wallet.
    Export {
        #[arg(long)]
        output: PathBuf,
        /// Password sealing the backup.
        #[arg(long, env = "XIANWALLET_BACKUP_PASSWORD", hide_env_values = true)]
        backup_password: String,
    },
    /// Decrypt a portable backup and optionally store it.
    Import {
        #[arg(long)]
        input: PathBuf,
        /// Password the backup was sealed with.
        #[arg(long, env = "XIANWALLET_BACKUP_PASSWORD", hide_env_values = true)]
        backup_password: String,
        /// Persist the imported wallet to the store.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Serialize)]
struct StatusReport {
    store_path: PathBuf,
    exists: bool,
    format: Option<FormatTag>,
    capabilities: Capabilities,
    requires_password: bool,
}

#[derive(Serialize)]
struct WalletReport<'a> {
    public_key: &'a str,
    node_url: Option<&'a str>,
    has_mnemonic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mnemonic: Option<&'a str>,
}

impl<'a> WalletReport<'a> {
    fn new(record: &'a SecretRecord, node_url: Option<&'a str>, reveal: bool) -> Self {
        Self {
            public_key: record.public_key(),
            node_url,
            has_mnemonic: record.mnemonic().is_some(),
            private_key: reveal.then(|| record.private_key()),
            mnemonic: record.mnemonic().filter(|_| reveal),
        }
    }
}

#[derive(Serialize)]
struct SavedReport {
    format: FormatTag,
    store_path: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_stored(
    store: &WalletStore,
    password: Option<&str>,
) -> Result<(SecretRecord, Option<String>)> {
    let path = store.store_path()?;
    store
        .try_load(password)
        .wrap_err("failed to load wallet store")?
        .ok_or_else(|| eyre!("no wallet stored at {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    let store = WalletStore::open(config).wrap_err("failed to open wallet store")?;
    let password = cli.password.as_deref();
    tracing::debug!(path = %store.store_path()?.display(), "opened wallet store");

    match cli.command {
        Command::Status => print_json(&StatusReport {
            store_path: store.store_path()?,
            exists: store.exists(),
            format: store.stored_format()?,
            capabilities: store.capabilities(),
            requires_password: store.requires_password(),
        }),
        Command::Save {
            private_key,
            public_key,
            mnemonic,
            node_url,
        } => {
            let record = SecretRecord::new(private_key, public_key, mnemonic)?;
            let format = store
                .save(&record, node_url.as_deref(), password)
                .wrap_err("failed to save wallet")?;
            print_json(&SavedReport {
                format,
                store_path: store.store_path()?,
            })
        }
        Command::Show { reveal } => {
            let (record, node_url) = load_stored(&store, password)?;
            print_json(&WalletReport::new(&record, node_url.as_deref(), reveal))
        }
        Command::Clear => {
            store.clear();
            if store.exists() {
                bail!("wallet store could not be removed");
            }
            print_json(&serde_json::json!({ "cleared": true }))
        }
        Command::Export {
            output,
            backup_password,
        } => {
            let (record, node_url) = load_stored(&store, password)?;
            let document = export_portable(&record, node_url.as_deref(), &backup_password)
                .wrap_err("failed to export wallet")?;
            write_backup_file(&output, &document)?;
            print_json(&serde_json::json!({ "output": output }))
        }
        Command::Import {
            input,
            backup_password,
            save,
        } => {
            let document = read_backup_file(&input)?;
            let (record, node_url) =
                import_portable(&document, &backup_password).wrap_err("failed to import backup")?;
            let format = if save {
                Some(
                    store
                        .save(&record, node_url.as_deref(), password)
                        .wrap_err("failed to save imported wallet")?,
                )
            } else {
                None
            };
            print_json(&serde_json::json!({
                "public_key": record.public_key(),
                "node_url": node_url,
                "saved_as": format,
            }))
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse())
}
