//! canonjson - rewrite JSON values into their canonical encoding.

use std::fs;
use std::io::{self, Read, Write};
use std::process;

use canonjson::{Encoder, Value};
use clap::Parser;

#[derive(Parser)]
#[command(name = "canonjson")]
#[command(about = "Rewrite JSON into canonical form: sorted keys, shortest numbers, no whitespace")]
struct Cli {
    /// Input files; `-` or no arguments reads standard input.
    inputs: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout().lock();
    let mut encoder = Encoder::new(stdout);

    let mut inputs = cli.inputs.clone();
    if inputs.is_empty() {
        inputs.push("-".to_string());
    }

    for input in &inputs {
        if input == "-" {
            encode_stream(io::stdin().lock(), &mut encoder)?;
        } else {
            let text = fs::read_to_string(input)
                .map_err(|err| format!("failed to read {}: {}", input, err))?;
            let decoded: serde_json::Value = serde_json::from_str(&text)
                .map_err(|err| format!("invalid JSON in {}: {}", input, err))?;
            encoder.encode(&Value::from(decoded))?;
        }
    }
    Ok(())
}

/// Decodes a stream of concatenated JSON values, canonicalizing each as
/// it arrives.
fn encode_stream<R: Read, W: Write>(
    reader: R,
    encoder: &mut Encoder<W>,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = serde_json::Deserializer::from_reader(reader).into_iter::<serde_json::Value>();
    for decoded in values {
        let decoded = decoded.map_err(|err| format!("invalid JSON on stdin: {}", err))?;
        encoder.encode(&Value::from(decoded))?;
    }
    Ok(())
}
