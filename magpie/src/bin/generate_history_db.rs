//! Generate a populated history database through the real capture pipeline.
//!
//! Useful for benchmarking and for pointing a UI at realistic data.
//!
//! Usage:
//!   cargo run --release --bin generate-history-db -- --output history.db --count 2000

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rand::Rng;

use magpie::models::CapturedPayload;
use magpie::{Config, HistoryStore, HistoryStoreApi, MemoryPasteboard};

#[derive(Parser)]
#[command(about = "Generate a synthetic clipboard history database")]
struct Args {
    /// Where to write the database file.
    #[arg(long, default_value = "history.db")]
    output: PathBuf,

    /// Number of capture events to generate.
    #[arg(long, default_value_t = 2000)]
    count: usize,
}

const WORDS: &[&str] = &[
    "riverside", "window", "compile", "meadow", "invoice", "draft", "october", "granite",
    "summary", "ticket", "harbor", "pipeline", "lantern", "notebook", "receipt", "orchard",
    "fragment", "signal", "timber", "archive", "pattern", "station", "crimson", "ledger",
];

const SOURCE_APPS: &[(&str, &str)] = &[
    ("Safari", "com.apple.Safari"),
    ("Xcode", "com.apple.dt.Xcode"),
    ("Terminal", "com.apple.Terminal"),
    ("Notes", "com.apple.Notes"),
    ("Mail", "com.apple.mail"),
    ("Slack", "com.tinyspeck.slackmacgap"),
];

const DOMAINS: &[&str] = &["example.com", "github.com", "docs.rs", "crates.io"];

// 1x1 transparent PNG; random trailing bytes vary the payload hash while
// the header keeps probing as a real image.
const PNG_STUB: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn word(rng: &mut impl Rng) -> &'static str {
    WORDS[rng.random_range(0..WORDS.len())]
}

fn sentence(rng: &mut impl Rng) -> String {
    let len = rng.random_range(3..12);
    (0..len).map(|_| word(rng)).collect::<Vec<_>>().join(" ")
}

fn link(rng: &mut impl Rng) -> String {
    format!(
        "https://{}/{}/{}",
        DOMAINS[rng.random_range(0..DOMAINS.len())],
        word(rng),
        rng.random_range(1..10_000)
    )
}

fn email(rng: &mut impl Rng) -> String {
    format!(
        "{}{}@{}",
        word(rng),
        rng.random_range(1..100),
        DOMAINS[rng.random_range(0..DOMAINS.len())]
    )
}

fn file_paths(rng: &mut impl Rng) -> Vec<String> {
    let count = rng.random_range(1..4);
    (0..count)
        .map(|_| format!("/Users/demo/Documents/{}-{}.pdf", word(rng), rng.random_range(1..100)))
        .collect()
}

fn image_bytes(rng: &mut impl Rng) -> Vec<u8> {
    let mut bytes = PNG_STUB.to_vec();
    bytes.extend((0..rng.random_range(16..256)).map(|_| rng.random::<u8>()));
    bytes
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.output.exists() {
        std::fs::remove_file(&args.output)
            .with_context(|| format!("failed to remove existing {}", args.output.display()))?;
    }

    println!("Creating history database at {}...", args.output.display());
    let store = HistoryStore::open(
        &args.output,
        Arc::new(MemoryPasteboard::new()),
        Config::default(),
    )
    .context("failed to open store")?;

    let mut rng = rand::rng();
    // A small hot set so some entries accumulate real copy counts.
    let hot: Vec<String> = (0..8).map(|_| sentence(&mut rng)).collect();

    for i in 0..args.count {
        let (app, app_id) = SOURCE_APPS[rng.random_range(0..SOURCE_APPS.len())];
        let app = Some(app.to_string());
        let app_id = Some(app_id.to_string());

        let payload = match rng.random_range(0..100) {
            0..=14 => CapturedPayload::new_text(
                hot[rng.random_range(0..hot.len())].clone(),
                None,
                app,
                app_id,
            ),
            15..=64 => CapturedPayload::new_text(sentence(&mut rng), None, app, app_id),
            65..=79 => CapturedPayload::new_text(link(&mut rng), None, app, app_id),
            80..=89 => CapturedPayload::new_text(email(&mut rng), None, app, app_id),
            90..=94 => CapturedPayload::new_files(file_paths(&mut rng), app, app_id),
            _ => CapturedPayload::new_image(image_bytes(&mut rng), app, app_id),
        };
        store.capture(payload);

        if (i + 1) % 500 == 0 {
            println!("  {}/{} capture events...", i + 1, args.count);
        }
    }

    // Favorite a handful so retention and category queries have material.
    for entry in store.by_category(magpie::Category::History)?.iter().take(5) {
        if let Some(id) = entry.id {
            store.toggle_favorite(id)?;
        }
    }

    store.flush();
    println!("Done.");
    println!("  Entries:  {}", store.count());
    println!("  Size:     {:.1} KB", store.database_size() as f64 / 1024.0);
    store.close();
    Ok(())
}
