use anyhow::{Context, Result, bail};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use pwoffice::generator::{self, CharClasses};
use pwoffice::policy::Policy;
use pwoffice::{Added, CredentialStore, Entry, StoreError, StoreState, resolve_config, strength};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

mod prompt;

#[derive(Debug, clap::Args)]
struct ClassArgs {
    /// Leave out uppercase letters
    #[arg(long)]
    no_upper: bool,

    /// Leave out lowercase letters
    #[arg(long)]
    no_lower: bool,

    /// Leave out digits
    #[arg(long)]
    no_digits: bool,

    /// Leave out symbols
    #[arg(long)]
    no_symbols: bool,
}

impl ClassArgs {
    fn to_classes(&self) -> CharClasses {
        CharClasses {
            upper: !self.no_upper,
            lower: !self.no_lower,
            digits: !self.no_digits,
            symbols: !self.no_symbols,
        }
    }
}

#[derive(Debug, clap::Args)]
struct PolicyArgs {
    /// Minimum length (default: 8)
    #[arg(long, env = "POLICY_MIN_LENGTH", default_value_t = 8)]
    min_length: usize,

    /// Maximum length (default: 128)
    #[arg(long, env = "POLICY_MAX_LENGTH", default_value_t = 128)]
    max_length: usize,

    /// Require an uppercase letter
    #[arg(long, env = "POLICY_REQUIRE_UPPER", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    require_upper: bool,

    /// Require a lowercase letter
    #[arg(long, env = "POLICY_REQUIRE_LOWER", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    require_lower: bool,

    /// Require a digit
    #[arg(long, env = "POLICY_REQUIRE_DIGIT", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    require_digit: bool,

    /// Require a symbol
    #[arg(long, env = "POLICY_REQUIRE_SYMBOL", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    require_symbol: bool,
}

impl PolicyArgs {
    fn to_policy(&self) -> Result<Policy> {
        Policy::new(
            self.min_length,
            self.max_length,
            self.require_upper,
            self.require_lower,
            self.require_digit,
            self.require_symbol,
        )
    }
}

#[derive(Debug, Parser)]
#[command(name = "pwoffice")]
#[command(
    version,
    about = "Password generator, strength and policy checker, and encrypted credential store."
)]
struct Cli {
    /// Directory holding the key and the encrypted database
    #[arg(long, global = true, value_name = "DIR", env = "PWOFFICE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to the encryption key file
    #[arg(long, global = true, value_name = "PATH", env = "PWOFFICE_KEY_FILE")]
    key_file: Option<PathBuf>,

    /// Path to the encrypted database file
    #[arg(long, global = true, value_name = "PATH", env = "PWOFFICE_DB_FILE")]
    db_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates a random password
    Generate {
        /// Number of characters (minimum 4)
        #[arg(short, long, default_value_t = 16)]
        length: usize,

        #[command(flatten)]
        classes: ClassArgs,

        /// Copy to the clipboard instead of printing
        #[arg(long)]
        copy: bool,
    },

    /// Scores the strength of a password
    Strength {
        /// Password to check (prompted when omitted)
        password: Option<String>,
    },

    /// Checks a password against the configured policy
    Policy {
        /// Password to check (prompted when omitted)
        password: Option<String>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Creates the data directory and encryption key
    Init,

    /// Stores a credential
    #[command(arg_required_else_help = true)]
    Add {
        label: String,
        username: String,

        /// Secret value (read from a hidden prompt or stdin when omitted)
        #[arg(long, conflicts_with = "generate")]
        secret: Option<String>,

        /// Store a freshly generated password of this length
        #[arg(long, value_name = "LENGTH")]
        generate: Option<usize>,

        /// Replace an existing entry with the same label
        #[arg(short, long)]
        force: bool,
    },

    /// Lists stored labels and usernames
    List,

    /// Reveals a stored credential by its list number
    #[command(arg_required_else_help = true)]
    Show {
        position: NonZeroUsize,

        /// Copy the secret to the clipboard instead of printing it
        #[arg(long)]
        copy: bool,
    },

    /// Deletes a stored credential by its list number
    #[command(arg_required_else_help = true)]
    Delete {
        position: NonZeroUsize,

        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },

    /// Deletes every stored credential (keeps the key)
    DeleteAll {
        /// Confirmation word, must be DELETE
        #[arg(long, value_name = "WORD")]
        confirm: Option<String>,
    },

    /// Deletes the key and every stored credential
    Reset {
        /// Confirmation word, must be RESET
        #[arg(long, value_name = "WORD")]
        confirm: Option<String>,
    },

    /// Shows where the store lives and its state
    Info,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pwoffice=warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        data_dir,
        key_file,
        db_file,
        command,
    } = Cli::parse();
    let open_store = || -> Result<CredentialStore> {
        let config = resolve_config(data_dir.clone(), key_file.clone(), db_file.clone())?;
        Ok(CredentialStore::open(&config))
    };

    match command {
        Commands::Generate {
            length,
            classes,
            copy,
        } => {
            let classes = classes.to_classes();
            if classes.is_empty() {
                eprintln!("No character types selected; using all characters.");
            }
            let password = generator::generate(length, classes)?;
            if copy {
                copy_to_clipboard(&password)?;
                println!("password copied to clipboard");
            } else {
                println!("{}", password.as_str());
            }
        }
        Commands::Strength { password } => {
            let password = password_arg(password)?;
            let report = strength::assess(&password);

            println!(
                "Strength : {}  (score: {}/{})",
                report.strength,
                report.score,
                strength::MAX_SCORE
            );
            println!("Length   : {} chars  {}", report.length, mark(report.length >= 8));
            println!(
                "Uppercase: {}  Lowercase: {}",
                mark(report.has_upper),
                mark(report.has_lower)
            );
            println!(
                "Digits   : {}  Symbols  : {}",
                mark(report.has_digit),
                mark(report.has_symbol)
            );
            println!("Tip: {}", report.strength.tip());
        }
        Commands::Policy { password, policy } => {
            let policy = policy.to_policy()?;
            let password = password_arg(password)?;
            let report = policy.check(&password);

            for (rule, passed) in &report.results {
                println!("[{}] {rule}", mark(*passed));
            }
            if !report.passed() {
                bail!("password fails one or more policy requirements");
            }
            println!("password passes all policy requirements");
        }
        Commands::Init => {
            let store = open_store()?;
            let had_key = store.keys().has_key()?;
            store.ensure_storage_ready()?;
            store.load_or_create_key()?;
            if had_key {
                println!("store already initialized");
            } else {
                println!("store initialized, new encryption key created");
            }
        }
        Commands::Add {
            label,
            username,
            secret,
            generate,
            force,
        } => {
            let store = open_store()?;
            let secret = match (secret, generate) {
                (Some(secret), _) => Zeroizing::new(secret),
                (None, Some(length)) => generator::generate(length, CharClasses::default())?,
                (None, None) => prompt::read_secret("Secret (input hidden): ")?,
            };
            let build = || Entry::new(label.trim(), username.trim(), secret.as_str());

            let outcome = match store.add(build()?, force) {
                Err(StoreError::DuplicateLabel(existing)) if prompt::is_interactive() => {
                    if !prompt::confirm(&format!("'{existing}' already exists. Overwrite?"))? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                    store.add(build()?, true)?
                }
                other => other?,
            };

            match outcome {
                Added::New => println!("'{}' saved", label.trim()),
                Added::Replaced => println!("'{}' updated", label.trim()),
            }
        }
        Commands::List => {
            let store = open_store()?;
            let entries = store.list()?;

            if entries.is_empty() {
                println!("No saved passwords yet.");
                return Ok(());
            }

            let num_width = entries.len().to_string().len().max(1);
            let label_width = entries
                .iter()
                .map(|e| e.label.chars().count())
                .chain(std::iter::once("Label".len()))
                .max()
                .unwrap_or_default();

            println!("{:>num_width$}  {:<label_width$}  Username", "#", "Label");
            println!("{:->num_width$}  {:-<label_width$}  {:-<8}", "", "", "");
            for (i, e) in entries.iter().enumerate() {
                println!("{:>num_width$}  {:<label_width$}  {}", i + 1, e.label, e.username);
            }
        }
        Commands::Show { position, copy } => {
            let store = open_store()?;
            let entry = store
                .reveal(position.get() - 1)
                .with_context(|| format!("no entry number {position}"))?;

            println!("Label   : {}", entry.label());
            println!("Username: {}", entry.username());
            if copy {
                copy_to_clipboard(entry.secret())?;
                println!("Password: (copied to clipboard)");
            } else {
                println!("Password: {}", entry.secret());
            }
        }
        Commands::Delete { position, yes } => {
            let store = open_store()?;
            let index = position.get() - 1;

            if !yes {
                let entries = store.list()?;
                let Some(target) = entries.get(index) else {
                    return Err(StoreError::IndexOutOfRange {
                        index,
                        len: entries.len(),
                    }
                    .into());
                };
                if !prompt::confirm(&format!("Delete '{}'?", target.label))? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let removed = store
                .delete(index)
                .with_context(|| format!("no entry number {position}"))?;
            println!("'{}' deleted", removed.label());
        }
        Commands::DeleteAll { confirm } => {
            let store = open_store()?;
            if !prompt::confirm_word(
                "DELETE",
                confirm,
                "Type DELETE to confirm wiping all saved passwords: ",
            )? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete_all()?;
            println!("All passwords deleted.");
        }
        Commands::Reset { confirm } => {
            let store = open_store()?;
            eprintln!("WARNING: this permanently deletes the key and all passwords.");
            if !prompt::confirm_word("RESET", confirm, "Type RESET to confirm: ")? {
                println!("Cancelled.");
                return Ok(());
            }
            store.reset_all()?;
            println!("Database and key removed. A new key will be created on next use.");
        }
        Commands::Info => {
            let store = open_store()?;
            let state = match store.state()? {
                StoreState::Unready => "not initialized",
                StoreState::Empty => "empty",
                StoreState::Populated => "populated",
                StoreState::Unreadable => "unreadable (run `pwoffice reset` to start over)",
            };

            println!("Data dir: {}", store.keys().data_dir().display());
            println!("Key file: {}", store.keys().key_path().display());
            println!("Database: {}", store.blob_path().display());
            println!("State   : {state}");
        }
    }

    Ok(())
}

fn password_arg(password: Option<String>) -> Result<Zeroizing<String>> {
    let password = match password {
        Some(password) => Zeroizing::new(password),
        None => prompt::read_secret("Password to check: ")?,
    };
    if password.is_empty() {
        bail!("no password entered");
    }
    Ok(password)
}

fn mark(ok: bool) -> &'static str {
    if ok { "✔" } else { "✘" }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text)
        .context("failed to copy to clipboard")?;
    Ok(())
}
