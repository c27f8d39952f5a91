//! # invoicr CLI
//!
//! Usage:
//!   invoicr input.json -o output.pdf
//!   echo '{ ... }' | invoicr -o output.pdf
//!   invoicr --example > invoice.json
//!
//! Set `RUST_LOG=debug` to see page break decisions.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "invoicr")]
#[command(about = "Render an invoice described as JSON to PDF")]
struct Cli {
    /// Invoice JSON; read from stdin when omitted
    input: Option<PathBuf>,

    /// Where to write the PDF
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Print a sample invoice JSON and exit
    #[arg(long)]
    example: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.example {
        println!("{}", invoicr::EXAMPLE_JSON);
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(len) => {
            eprintln!("✓ Written {} bytes to {}", len, cli.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<usize, invoicr::InvoiceError> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let pdf = invoicr::render_json(&input)?;
    fs::write(&cli.output, &pdf)?;
    Ok(pdf.len())
}
