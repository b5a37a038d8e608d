//! Example: Select the newest verified CA bundle
//!
//! Synchronizes the catalog when stale, verifies candidates newest first and
//! prints the selected bundle.
//!
//! Usage:
//!   cargo run --example latest_bundle -- [data-dir] [trust-channel]
//!   cargo run --example latest_bundle -- --local <data-dir>

use certainty::{Catalog, Fetch, RemoteFetch, SelectionPolicy, TrustChannel};
use std::env;
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 3 && args[1] == "--local" {
        run_local(PathBuf::from(&args[2])).await;
        return;
    }

    let data_dir = match args.get(1) {
        Some(dir) => PathBuf::from(dir),
        None => match certainty::default_data_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    };
    let channel = args
        .get(2)
        .map(|name| TrustChannel::new(name.as_str()))
        .unwrap_or_default();

    if let Err(e) = tokio::fs::create_dir_all(&data_dir).await {
        eprintln!("Error creating {}: {}", data_dir.display(), e);
        process::exit(1);
    }

    let fetch = match RemoteFetch::new(&data_dir).await {
        Ok(fetch) => fetch,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match fetch.latest_bundle(&channel, SelectionPolicy::default()).await {
        Ok(bundle) => {
            println!("Channel: {}", bundle.trust_channel());
            println!("Bundle:  {}", bundle.file_path().display());
            println!("SHA-256: {}", bundle.sha256_sum());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run_local(data_dir: PathBuf) {
    println!("Selecting from {} without network access", data_dir.display());

    let catalog = match Catalog::open(&data_dir).await {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let fetch = match Fetch::new(catalog) {
        Ok(fetch) => fetch,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match fetch
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::digest_only())
        .await
    {
        Ok(bundle) => println!("Bundle: {}", bundle.file_path().display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
