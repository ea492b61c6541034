use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List provider descriptions from the configured sources.
    Providers {
        /// Print registry events to stderr.
        #[arg(long)]
        events: bool,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        http: HttpArgs,
    },
    /// Search provider descriptions by title or description.
    Search {
        text: String,
        #[arg(long)]
        events: bool,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        http: HttpArgs,
    },
    /// Resolve one provider description into a full provider.
    Resolve {
        /// Provider id, as listed by `providers`.
        id: String,
        #[arg(long)]
        events: bool,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        http: HttpArgs,
        #[command(flatten)]
        resolver: ResolverArgs,
    },
    /// Parse an authentication document from a file or an http(s) URL.
    CheckAuthDoc {
        target: String,
        #[arg(long)]
        warnings_as_errors: bool,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        http: HttpArgs,
    },
}
