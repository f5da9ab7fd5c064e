use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::credentials::DEEPL_KEY_VAR;

#[derive(Parser, Debug)]
#[command(
    name = "subtitlr",
    about = "Subtitlr - AI-assisted subtitle generation for YouTube videos",
    version,
    long_about = "A subtitle generator for YouTube videos. Downloads the audio track, \
                  transcribes it with OpenAI's Whisper API into SRT subtitles, and \
                  translates subtitle files with DeepL."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a .env file holding your OpenAI API key
    Configure {
        /// OpenAI API key
        #[arg(long, alias = "apiKey", value_name = "KEY")]
        api_key: String,

        /// Credential file to create
        #[arg(long, value_name = "FILE", default_value = ".env")]
        path: PathBuf,
    },

    /// Generate SRT subtitles from a YouTube video or a local MP3 file
    Generate {
        /// YouTube video ID or URL (or --file)
        #[arg(long, value_name = "ID")]
        id: Option<String>,

        /// Audio file in MP3 format (or --id)
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Language spoken in the video (ISO 639-1)
        #[arg(short, long, value_name = "LANG", default_value = "fr")]
        lang: String,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "output.srt")]
        output: PathBuf,

        /// OpenAI API key (read from .env or OPENAI_API_KEY when omitted)
        #[arg(long, alias = "apiKey", value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Translate an SRT file with DeepL
    Translate {
        /// Subtitle file to translate
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Language to translate the subtitles to (ISO 639-1, e.g. de or en-US)
        #[arg(long, value_name = "LANG")]
        lang: String,

        /// Output file
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        /// DeepL API key
        #[arg(
            long,
            alias = "apiKeyDeepL",
            value_name = "KEY",
            env = DEEPL_KEY_VAR,
            hide_env_values = true
        )]
        api_key_deepl: String,
    },
}
