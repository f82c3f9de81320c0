// bpio - self-describing token encryption.
//
// Ciphers: AES-GCM, ChaCha20-Poly1305, XChaCha20-Poly1305, Salsa20,
// Threefish-512, plus the legacy 3DES / RC2 / AES-CBC channels.
// Token format: BPIO container + algorithm payload, text-encoded.

use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use bpio::cli::{Cli, run};
use bpio::Error;

/// Exit codes: 0 success, 1 validation failure, 2 cryptographic failure,
/// 3 I/O failure.
fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(kind) = error.downcast_ref::<Error>() {
        return match kind {
            Error::InvalidArgument(_) => 1,
            Error::Malformed(_) | Error::AuthenticationFailure | Error::Unsupported(_) => 2,
        };
    }
    if error.downcast_ref::<std::io::Error>().is_some() {
        return 3;
    }
    1
}

fn main() {
    // Usage errors are validation failures (exit 1); help and version are
    // not errors at all.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let level = if cli.silent { LevelFilter::ERROR } else { LevelFilter::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        process::exit(exit_code(&e));
    }
}
