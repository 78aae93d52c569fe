mod cli;
mod input;

use crate::cli::{Cli, Command};
use crate::input::{load_document, render};
use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use recstore::UpdateCounts;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    logger_builder(std::env::var("RUST_LOG").ok().as_deref(), args.debug).init();

    let uri = args.mongo_uri.as_str();
    let (db, collection) = (args.db.as_str(), args.collection.as_str());

    match &args.command {
        Command::Insert { document } => {
            let document = load_document(document, args.extended_json)?;
            recstore::insert(uri, db, collection, document).await?;
            println!("inserted 1 document into {}.{}", db, collection);
        }
        Command::Update { key, values } => {
            let key = load_document(key, args.extended_json)?;
            let values = load_document(values, args.extended_json)?;
            let counts = recstore::update(uri, db, collection, key, values).await?;
            println!("{}", describe_update(counts, db, collection));
        }
        Command::Find { key, unique } => {
            let key = load_document(key, args.extended_json)?;
            let found = recstore::find(uri, db, collection, key, *unique).await?;
            for doc in found.into_documents() {
                println!("{}", render(doc));
            }
        }
        Command::Exists { query, unique } => {
            let query = load_document(query, args.extended_json)?;
            let exists = recstore::exists_and_unique(uri, db, collection, query, *unique).await?;
            println!("{}", exists);
        }
    }

    Ok(())
}

/// Starts from `RUST_LOG` (default `warn`); `--debug` raises this crate to debug.
fn logger_builder(env_filter: Option<&str>, debug: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(env_filter.unwrap_or("warn"));
    if debug {
        builder.filter_module("recstore", LevelFilter::Debug);
    }
    builder
}

fn describe_update(counts: UpdateCounts, db: &str, collection: &str) -> String {
    format!(
        "matched {} and modified {} document(s) in {}.{}",
        counts.matched, counts.modified, db, collection
    )
}
