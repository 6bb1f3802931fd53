//! Passlock CLI - passphrase-based file encryption
//!
//! Command-line front end over the passlock cipher service: reads a whole
//! file, encrypts or decrypts it, and writes the result next to it.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use passlock::events::Direction;
use passlock::file_ops::{self, Encoding, FileOptions};
use passlock::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use passlock::{CipherService, Scheme};

#[derive(Parser)]
#[command(name = "passlock")]
#[command(version)]
#[command(about = "Passphrase-based file encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Cipher scheme: "aes-ecb" or "secretbox"
    #[arg(long, global = true, default_value_t = Scheme::AesEcb)]
    scheme: Scheme,

    /// Store ciphertext as text armor (and expect armor when decrypting)
    #[arg(long, global = true)]
    armor: bool,

    /// Overwrite the output file if it exists
    #[arg(short, long, global = true)]
    force: bool,

    /// Log operation progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the encrypted data to [default: encrypted_<name>
        /// next to the input]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the decrypted data to [default: decrypted_<name>
        /// next to the input]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Update an encrypted file with new content, while validating
    /// that the passphrase is not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing encrypted file to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Failures reach the user through the "Error:" line below; the event log
    // would only repeat them, so it is off unless -v asks for progress.
    let default_filter = if cli.verbose {
        "info"
    } else {
        "warn,passlock::events=off"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let options = FileOptions {
        service: CipherService::new(cli.scheme),
        encoding: if cli.armor {
            Encoding::Armored
        } else {
            Encoding::Raw
        },
        overwrite: cli.force,
    };
    let mut reader = get_passphrase_reader(cli.passphrase_stdin);

    let result = match cli.command {
        Commands::Encrypt { input, output } => {
            output_path(&input, output, Direction::Encrypt).and_then(|output| {
                file_ops::encrypt_file(&input, &output, &options, &mut *reader)
            })
        }
        Commands::Decrypt { input, output } => {
            output_path(&input, output, Direction::Decrypt).and_then(|output| {
                file_ops::decrypt_file(&input, &output, &options, &mut *reader)
            })
        }
        Commands::Update { input, output } => {
            file_ops::update_file(&input, &output, &options, &mut *reader)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn output_path(
    input: &Path,
    output: Option<PathBuf>,
    direction: Direction,
) -> passlock::Result<PathBuf> {
    match output {
        Some(output) => Ok(output),
        None => file_ops::default_output_path(input, direction),
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // Cipher failures already embed their fault in the message.
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}
