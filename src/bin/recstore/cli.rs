// src/bin/recstore/cli.rs
use clap::{Parser, Subcommand};

/// CLI arguments for recstore
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// MongoDB connection URI
    #[arg(long)]
    pub mongo_uri: String,

    /// Database name
    #[arg(long)]
    pub db: String,

    /// Collection name
    #[arg(long)]
    pub collection: String,

    /// Parse document arguments as MongoDB Extended JSON ($oid, $date, ...)
    #[arg(long, global = true)]
    pub extended_json: bool,

    /// Log connection lifecycle to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Document arguments take inline JSON or `@path` to a .json/.yaml/.yml file.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert one document
    Insert {
        #[arg(long)]
        document: String,
    },

    /// Set fields on the first document matching a key
    Update {
        #[arg(long)]
        key: String,

        #[arg(long)]
        values: String,
    },

    /// Print documents matching a key
    Find {
        #[arg(long, default_value = "{}")]
        key: String,

        /// Return a single document, failing when none matches
        #[arg(long)]
        unique: bool,
    },

    /// Print whether a query matches any document
    Exists {
        #[arg(long)]
        query: String,

        /// Fail when more than one document matches
        #[arg(long)]
        unique: bool,
    },
}
