use std::path::PathBuf;

use clap::Args;
use stegokit_core::{MethodOptions, Monitor};

use super::KeyArgs;
use crate::CliResult;

/// Recovers hidden data from an image
#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Source image that contains hidden data
    #[arg(
        short = 'i',
        long = "in",
        value_name = "image source file",
        required = true
    )]
    pub image: PathBuf,

    /// Extracted files will be stored in that folder
    #[arg(short = 'o', long = "out", value_name = "output folder", default_value = ".")]
    pub output_folder: PathBuf,

    /// Restrict extraction to noisy image regions
    #[arg(long)]
    pub noise_filter: bool,
}

impl ExtractArgs {
    pub fn run(self) -> CliResult<()> {
        let key = self.key.resolve(false)?;
        let options = MethodOptions {
            noise_filter: self.noise_filter,
        };
        let monitor = Monitor::with_progress(|p| log::debug!("extracting {p}%"));

        let message = stegokit_core::commands::extract_to_dir(
            &self.image,
            &self.output_folder,
            &key,
            &options,
            &monitor,
        )?;

        if let Some(message) = message {
            println!("{message}");
        }
        Ok(())
    }
}
