//! Show how a trained tokenizer splits text
//!
//! Loads a `.model` file, encodes the input, and prints every token as a
//! coloured span followed by the token IDs and counts.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example visualize -- tokenizer.model "The spice must flow."
//! echo "The spice must flow." | cargo run --example visualize -- tokenizer.model --show-whitespace
//! cargo run --example visualize -- tokenizer.model "The spice must flow." --json
//! ```

use bytepair::{TokenId, Tokenizer};
use clap::Parser;
use env_logger::Env;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;

/// Background colours cycled across consecutive tokens
const COLORS: [&str; 5] = [
    "\x1b[48;5;98m",
    "\x1b[48;5;114m",
    "\x1b[48;5;215m",
    "\x1b[48;5;203m",
    "\x1b[48;5;39m",
];
const RESET: &str = "\x1b[0m";

#[derive(Parser)]
#[command(name = "visualize", about = "Colour each token of the input text")]
struct Args {
    /// Model file written by Tokenizer::save
    model: PathBuf,

    /// Text to tokenize (read from stdin when omitted)
    text: Option<String>,

    /// Render spaces as '⋅' and mark line breaks
    #[arg(long)]
    show_whitespace: bool,

    /// Print a JSON report instead of coloured output
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    tokens: Vec<String>,
    ids: Vec<TokenId>,
    token_count: usize,
    char_count: usize,
}

fn token_text(tokenizer: &Tokenizer, id: TokenId, show_whitespace: bool) -> String {
    let bytes = tokenizer.vocab().get(id).unwrap_or_default();
    let text = String::from_utf8_lossy(bytes);
    if show_whitespace {
        text.replace(' ', "⋅").replace('\n', "↵\n")
    } else {
        text.into_owned()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let tokenizer = Tokenizer::load(&args.model)?;

    let text = match args.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let ids = tokenizer.encode(&text);
    let tokens: Vec<String> = ids
        .iter()
        .map(|&id| token_text(&tokenizer, id, args.show_whitespace))
        .collect();

    if args.json {
        let report = Report {
            token_count: ids.len(),
            char_count: text.chars().count(),
            tokens,
            ids,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut rendered = String::new();
    for (i, token) in tokens.iter().enumerate() {
        rendered.push_str(COLORS[i % COLORS.len()]);
        rendered.push_str(token);
        rendered.push_str(RESET);
    }

    println!("{}\n", rendered);
    println!("Token IDs:  {:?}", ids);
    println!("Tokens:     {}", ids.len());
    println!("Characters: {}", text.chars().count());

    Ok(())
}
