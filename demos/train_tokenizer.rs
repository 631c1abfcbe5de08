//! Train a BPE tokenizer on a text file
//!
//! This example demonstrates:
//! - Loading a training corpus
//! - Training to a target vocabulary size with progress logging
//! - Registering special tokens
//! - Saving the `.model` and `.vocab` files
//! - Measuring compression on the corpus
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example train_tokenizer -- corpus.txt --vocab-size 1024 --out models/corpus
//! ```

use bytepair::{LineSplit, Tokenizer, TrainConfig};
use clap::Parser;
use env_logger::Env;
use log::{info, LevelFilter};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "train_tokenizer", about = "Train a byte-level BPE tokenizer")]
struct Args {
    /// Training corpus (UTF-8 text)
    corpus: PathBuf,

    /// Target vocabulary size, including the 256 byte tokens
    #[arg(long, default_value_t = 512)]
    vocab_size: usize,

    /// Output prefix; writes <out>.model and <out>.vocab
    #[arg(long, default_value = "tokenizer")]
    out: PathBuf,

    /// Special token to register after training (repeatable)
    #[arg(long = "special")]
    special_tokens: Vec<String>,

    /// Pattern string stored in the model file
    #[arg(long, default_value = "")]
    pattern: String,

    /// Never learn merges across line breaks
    #[arg(long)]
    split_lines: bool,

    /// Log every N merges
    #[arg(long, default_value_t = 50)]
    log_interval: usize,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less output (-q warnings only, -qq errors only)
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = match (quiet, verbose) {
        (0, 0) => LevelFilter::Info,
        (0, 1) => LevelFilter::Debug,
        (0, _) => LevelFilter::Trace,
        (1, _) => LevelFilter::Warn,
        _ => LevelFilter::Error,
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let text = fs::read_to_string(&args.corpus)?;
    info!(
        "loaded corpus {}: {} bytes ({:.2} MB)",
        args.corpus.display(),
        text.len(),
        text.len() as f64 / 1_000_000.0
    );

    let mut tokenizer = Tokenizer::new();
    if args.split_lines {
        tokenizer = tokenizer.with_pre_tokenizer(LineSplit);
    }
    tokenizer.set_pattern(args.pattern.as_str())?;

    let config = TrainConfig::new(args.vocab_size).with_log_interval(args.log_interval);
    let start = Instant::now();
    tokenizer.train_with_config(&text, &config, |_| {})?;
    let train_time = start.elapsed();

    if !args.special_tokens.is_empty() {
        tokenizer.register_special_tokens(&args.special_tokens)?;
    }

    let start = Instant::now();
    let encoded = tokenizer.encode(&text);
    let encode_time = start.elapsed();

    // Round-trip check on the whole corpus
    if tokenizer.decode(&encoded)? != text {
        return Err("round-trip check failed".into());
    }

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let model_path = tokenizer.save(&args.out)?;

    let compression_ratio = text.len() as f64 / encoded.len().max(1) as f64;
    let stats = tokenizer.stats();

    println!("\n{}", "=".repeat(60));
    println!("  Results");
    println!("{}", "=".repeat(60));
    println!("  Training time:      {:.2}s", train_time.as_secs_f64());
    println!("  Encoding time:      {:.2}s", encode_time.as_secs_f64());
    println!("  Vocabulary size:    {}", stats.vocab_size);
    println!("  Learned merges:     {}", stats.num_merges);
    println!("  Special tokens:     {}", stats.num_special_tokens);
    println!("  Original size:      {} bytes", text.len());
    println!("  Encoded length:     {} tokens", encoded.len());
    println!("  Compression ratio:  {:.2}x", compression_ratio);
    println!("  Model:              {}", model_path.display());
    println!("{}\n", "=".repeat(60));

    Ok(())
}
