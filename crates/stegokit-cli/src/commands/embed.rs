use std::path::PathBuf;

use clap::Args;
use stegokit_core::{MethodOptions, Monitor};

use super::KeyArgs;
use crate::CliResult;

/// Hides a message and/or files inside a carrier image
#[derive(Args, Debug)]
pub struct EmbedArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Carrier image, used readonly
    #[arg(short = 'i', long = "in", value_name = "image file", required = true)]
    pub image: PathBuf,

    /// Where the resulting image is written
    #[arg(
        short = 'o',
        long = "out",
        value_name = "output image file",
        required = true
    )]
    pub output: PathBuf,

    /// A text message that will be hidden
    #[arg(
        short,
        long,
        value_name = "text message",
        required_unless_present = "data_files"
    )]
    pub message: Option<String>,

    /// File(s) to hide in the image
    #[arg(
        short = 'd',
        long = "data",
        value_name = "data files",
        required_unless_present = "message"
    )]
    pub data_files: Option<Vec<PathBuf>>,

    /// Restrict embedding to noisy image regions
    #[arg(long)]
    pub noise_filter: bool,
}

impl EmbedArgs {
    pub fn run(self) -> CliResult<()> {
        let key = self.key.resolve(true)?;
        let options = MethodOptions {
            noise_filter: self.noise_filter,
        };
        let monitor = Monitor::with_progress(|p| log::debug!("embedding {p}%"));

        stegokit_core::commands::embed_files(
            &self.image,
            &self.output,
            self.message.as_deref(),
            &self.data_files.unwrap_or_default(),
            &key,
            &options,
            &monitor,
        )
    }
}
