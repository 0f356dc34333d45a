//! envi CLI - Command line interface for protecting `.env` files.
//!
//! This tool reads a file, hands its bytes to the envi codecs and writes
//! the result. Password prompting, config defaults and file handling live
//! here; the codecs never touch the terminal.

mod config;
mod validate;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{write_private, CliConfig};
use envi_codec::{classify, decode, transform, CodecConfig};
use envi_common::{EnvFormat, Error, KeyFileMode, KeySource, Operation, Password};
use envi_crypto::generate_key_file;

#[derive(Parser)]
#[command(name = "envi")]
#[command(about = "envi - Encrypt and mask .env files")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.envi/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// How the key is obtained.
#[derive(Args, Debug, Clone, Default)]
struct KeyArgs {
    /// Use a key file instead of a password.
    #[arg(long)]
    use_key_file: bool,

    /// Path to the key file (default: .envi.key). Implies --use-key-file.
    #[arg(short, long)]
    key_file: Option<PathBuf>,

    /// Password (not recommended: visible in shell history and process lists).
    #[arg(short, long, conflicts_with_all = ["use_key_file", "key_file"])]
    password: Option<String>,

    /// Only accept key files holding exactly 32 bytes (raw or base64).
    #[arg(long)]
    strict_key: bool,
}

/// Where content is read from and written to.
#[derive(Args, Debug, Clone)]
struct IoArgs {
    /// Input file.
    #[arg(short, long, default_value = ".env")]
    file: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Replace the input file with the result.
    #[arg(long)]
    in_place: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt the whole file.
    Encrypt {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        key: KeyArgs,
        /// Generate the key file if it does not exist. Implies --use-key-file.
        #[arg(long)]
        generate_key: bool,
    },

    /// Decrypt a whole-file encrypted file.
    Decrypt {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Encrypt values only, keeping variable names readable.
    Mask {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        key: KeyArgs,
        /// Generate the key file if it does not exist. Implies --use-key-file.
        #[arg(long)]
        generate_key: bool,
    },

    /// Decrypt masked values.
    Unmask {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Mask or encrypt according to the config defaults.
    Protect {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        key: KeyArgs,
        /// Mask values (wins over --encrypt).
        #[arg(short, long)]
        mask: bool,
        /// Encrypt the whole file.
        #[arg(short, long)]
        encrypt: bool,
        /// Generate the key file if it does not exist. Implies --use-key-file.
        #[arg(long)]
        generate_key: bool,
    },

    /// Detect the format and decrypt or unmask as needed.
    Open {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Report whether a file is plaintext, encrypted or masked.
    Detect {
        /// Files to inspect.
        #[arg(default_value = ".env")]
        files: Vec<PathBuf>,
    },

    /// Generate a new random key file.
    Keygen {
        /// Where to write the key (default: .envi.key or the configured key file).
        #[arg(short, long)]
        key_file: Option<PathBuf>,
    },

    /// Compare .env against .env.example.
    Validate {
        /// The env file to check.
        #[arg(short, long, default_value = ".env")]
        file: PathBuf,

        /// The example file listing required variables.
        #[arg(short, long, default_value = ".env.example")]
        example: PathBuf,

        /// Append missing variables with their example values.
        #[arg(long)]
        fix: bool,

        /// Fail on variables with empty values.
        #[arg(short, long)]
        strict: bool,

        /// Variables that must be present (comma-separated).
        #[arg(long, value_delimiter = ',')]
        required: Vec<String>,
    },

    /// Show or change config defaults.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config.
    Show,
    /// Print the config file location.
    Path,
    /// Set a config field.
    Set {
        /// Field name, e.g. use_masked_encryption.
        field: String,
        /// New value.
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => CliConfig::default_path()?,
    };
    let config = CliConfig::load(&config_path)?;

    match cli.command {
        Commands::Encrypt {
            io,
            key,
            generate_key,
        } => cmd_encode(Operation::Encrypt, &io, &key, generate_key, &config),

        Commands::Mask {
            io,
            key,
            generate_key,
        } => cmd_encode(Operation::Mask, &io, &key, generate_key, &config),

        Commands::Decrypt { io, key } => cmd_decode(Operation::Decrypt, &io, &key, &config),

        Commands::Unmask { io, key } => cmd_decode(Operation::Unmask, &io, &key, &config),

        Commands::Protect {
            io,
            key,
            mask,
            encrypt,
            generate_key,
        } => {
            let operation = protect_operation(mask, encrypt, &config)?;
            cmd_encode(operation, &io, &key, generate_key, &config)
        }

        Commands::Open { io, key } => cmd_open(&io, &key, &config),

        Commands::Detect { files } => cmd_detect(&files),

        Commands::Keygen { key_file } => {
            let path = key_file.unwrap_or_else(|| config.key_file());
            cmd_keygen(&path)
        }

        Commands::Validate {
            file,
            example,
            fix,
            strict,
            required,
        } => cmd_validate(&file, &example, fix, strict, &required),

        Commands::Config { action } => cmd_config(action, config, &config_path),

        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "envi", &mut io::stdout());
            Ok(())
        }
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Password> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Password::new(password))
}

/// Decide where the key comes from. Flags win over config defaults.
///
/// `confirm` asks for the password twice, for operations that create
/// protected content.
fn resolve_key_source(
    args: &KeyArgs,
    config: &CliConfig,
    confirm: bool,
    force_key_file: bool,
) -> Result<KeySource> {
    if let Some(password) = &args.password {
        warn!("Using a password from the command line is insecure; prefer the prompt or a key file");
        return Ok(KeySource::password(password.as_str()));
    }

    if force_key_file || args.use_key_file || args.key_file.is_some() || config.use_key_file_by_default {
        let path = args.key_file.clone().unwrap_or_else(|| config.key_file());
        debug!(path = %path.display(), "Using key file");
        return Ok(KeySource::KeyFile(path));
    }

    let password = prompt_password("Enter encryption password: ")?;
    if confirm {
        let again = prompt_password("Confirm encryption password: ")?;
        if !bool::from(password.as_bytes().ct_eq(again.as_bytes())) {
            bail!("Passwords do not match");
        }
    }
    Ok(KeySource::Password(password))
}

fn key_file_mode(args: &KeyArgs, config: &CliConfig) -> KeyFileMode {
    if args.strict_key {
        KeyFileMode::Strict
    } else {
        config.key_file_mode()
    }
}

/// Pick mask or encrypt for `protect`.
fn protect_operation(mask: bool, encrypt: bool, config: &CliConfig) -> Result<Operation> {
    if mask && encrypt {
        warn!("Both --mask and --encrypt given; using masked encryption");
        return Ok(Operation::Mask);
    }
    if mask {
        return Ok(Operation::Mask);
    }
    if encrypt {
        return Ok(Operation::Encrypt);
    }
    if !config.encrypt_by_default {
        bail!("Protection is disabled in the config; pass --mask or --encrypt");
    }
    if config.use_masked_encryption {
        Ok(Operation::Mask)
    } else {
        Ok(Operation::Encrypt)
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write the finished result. Files are replaced atomically, so the input
/// stays untouched if anything fails.
fn write_output(args: &IoArgs, content: &[u8]) -> Result<()> {
    let destination = if args.in_place {
        Some(args.file.as_path())
    } else {
        args.output.as_deref()
    };

    match destination {
        Some(path) => {
            write_private(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), size = content.len(), "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Encrypt or mask a plaintext file.
fn cmd_encode(
    operation: Operation,
    io: &IoArgs,
    key: &KeyArgs,
    generate_key: bool,
    config: &CliConfig,
) -> Result<()> {
    let content = read_input(&io.file)?;

    let format = classify(&content);
    if format.is_protected() {
        bail!(
            "{} is already {}; refusing to {} it again",
            io.file.display(),
            format,
            operation
        );
    }

    let source = resolve_key_source(key, config, true, generate_key)?;
    if generate_key {
        ensure_key_file(&source)?;
    }

    info!(file = %io.file.display(), "Running {}", operation);
    let codec = CodecConfig::new(operation, source).with_key_file_mode(key_file_mode(key, config));
    let output = transform(codec, &content)
        .with_context(|| format!("Failed to {} {}", operation, io.file.display()))?;

    write_output(io, &output)?;
    if operation == Operation::Mask {
        info!("Value masking successful. Variable names remain visible.");
    } else {
        info!("Encryption successful.");
    }
    Ok(())
}

/// Create the key file for `--generate-key` unless it already exists.
fn ensure_key_file(source: &KeySource) -> Result<()> {
    let KeySource::KeyFile(path) = source else {
        return Ok(());
    };

    match generate_key_file(path) {
        Ok((_, written)) => {
            info!(path = %written.display(), "Generated new encryption key");
            warn!("Keep this key file safe: it is required to decrypt your files");
            Ok(())
        }
        Err(Error::KeyFileExists(existing)) => {
            debug!(path = %existing.display(), "Key file exists, reusing it");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to generate key file"),
    }
}

/// Decrypt or unmask, insisting on the matching format.
fn cmd_decode(operation: Operation, io: &IoArgs, key: &KeyArgs, config: &CliConfig) -> Result<()> {
    let content = read_input(&io.file)?;

    let format = classify(&content);
    if Operation::decoder_for(format) != Some(operation) {
        let hint = match Operation::decoder_for(format) {
            Some(other) => format!(" (use `envi {}`)", other),
            None => String::new(),
        };
        bail!("{} is {}, cannot {} it{}", io.file.display(), format, operation, hint);
    }

    let source = resolve_key_source(key, config, false, false)?;
    let codec = CodecConfig::new(operation, source).with_key_file_mode(key_file_mode(key, config));
    let output = transform(codec, &content)
        .with_context(|| format!("Failed to {} {}", operation, io.file.display()))?;

    write_output(io, &output)?;
    info!(file = %io.file.display(), "Finished {}", operation);
    Ok(())
}

/// Decode whatever protection the file carries.
fn cmd_open(io: &IoArgs, key: &KeyArgs, config: &CliConfig) -> Result<()> {
    let content = read_input(&io.file)?;

    let format = classify(&content);
    if format == EnvFormat::Plaintext {
        info!(file = %io.file.display(), "File is not encrypted");
        if io.in_place {
            return Ok(());
        }
        return write_output(io, &content);
    }

    info!(file = %io.file.display(), format = %format, "Detected protected file");
    let source = resolve_key_source(key, config, false, false)?;
    let output = decode(source, key_file_mode(key, config), &content)
        .with_context(|| format!("Failed to open {}", io.file.display()))?;

    write_output(io, &output)
}

fn cmd_detect(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let content = read_input(file)?;
        println!("{}: {}", file.display(), classify(&content));
    }
    Ok(())
}

fn cmd_keygen(path: &Path) -> Result<()> {
    let (_, written) = generate_key_file(path).context("Failed to generate key file")?;

    println!("Encryption key saved to: {}", written.display());
    println!("IMPORTANT: Keep this key file safe. You will need it to decrypt your .env files.");
    println!("Consider backing it up in a secure location.");
    Ok(())
}

fn cmd_validate(
    file: &Path,
    example: &Path,
    fix: bool,
    strict: bool,
    required: &[String],
) -> Result<()> {
    let example_content = read_input(example)?;
    let mut env_content = read_input(file)?;

    if classify(&env_content) == EnvFormat::WholeFileEncrypted {
        bail!("{} is encrypted; run `envi decrypt` first", file.display());
    }

    let mut failures = Vec::new();

    let missing = validate::missing_variables(&env_content, &example_content);
    if !missing.is_empty() {
        println!(
            "Found {} missing variable(s) in {}:",
            missing.len(),
            file.display()
        );
        for variable in &missing {
            println!("  - {}", variable.name);
        }

        if fix {
            env_content = validate::append_missing(&env_content, &missing);
            write_private(file, &env_content)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Added {} missing variable(s) to {}", missing.len(), file.display());
        } else {
            println!("Run with --fix to add the missing variables");
            failures.push(format!("{} missing variable(s)", missing.len()));
        }
    }

    let extra = validate::extra_variables(&env_content, &example_content);
    if !extra.is_empty() {
        warn!(
            count = extra.len(),
            "Variables in {} not listed in {}: {}",
            file.display(),
            example.display(),
            extra.join(", ")
        );
    }

    if strict {
        let empty = validate::empty_variables(&env_content);
        if empty.is_empty() {
            println!("All variables have values");
        } else {
            println!("Variables with empty values:");
            for name in &empty {
                println!("  - {}", name);
            }
            failures.push(format!("{} empty value(s)", empty.len()));
        }
    }

    let absent = validate::missing_required(&env_content, required);
    if !absent.is_empty() {
        println!("Missing required variables:");
        for name in &absent {
            println!("  - {}", name);
        }
        failures.push(format!("{} required variable(s) absent", absent.len()));
    }

    if !failures.is_empty() {
        bail!("Validation failed for {}: {}", file.display(), failures.join(", "));
    }

    println!(
        "Validation successful: {} matches {}",
        file.display(),
        example.display()
    );
    Ok(())
}

fn cmd_config(action: ConfigAction, mut config: CliConfig, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Set { field, value } => {
            config.set(&field, &value)?;
            config.save(path)?;
            println!("Updated {} in {}", field, path.display());
        }
    }
    Ok(())
}
