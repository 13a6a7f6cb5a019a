use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mkvtag")]
#[command(author, version, about = "Edit Matroska/WebM titles, tags and attachments in place")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show title, duration, tracks, tags and attachments
    Show {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the segment title
    SetTitle {
        file: PathBuf,
        title: String,
    },

    /// Remove the segment title
    ClearTitle {
        file: PathBuf,
    },

    /// Set a tag on the file-wide (medium) tag, replacing existing values
    SetTag {
        file: PathBuf,

        /// Tag name, e.g. ARTIST (stored upper-case)
        key: String,

        value: String,

        /// Language of the value (e.g. "eng")
        #[arg(long)]
        language: Option<String>,
    },

    /// Remove all tags, the title and all attachments
    RemoveTags {
        file: PathBuf,
    },

    /// Attach a file
    Attach {
        file: PathBuf,

        /// File to attach
        path: PathBuf,

        /// MIME type (guessed from the extension if not specified)
        #[arg(long)]
        mime: Option<String>,

        /// Attachment description
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove attachments by filename or description
    Detach {
        file: PathBuf,
        name: String,
    },

    /// Write an attachment's payload to a file
    Extract {
        file: PathBuf,
        name: String,
        out: PathBuf,
    },

    /// Verify the DocType and list the SeekHead entries
    Check {
        file: PathBuf,
    },
}
