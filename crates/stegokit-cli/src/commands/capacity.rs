use std::path::PathBuf;

use clap::Args;
use stegokit_core::MethodOptions;

use super::KeyArgs;
use crate::CliResult;

/// Reports how many payload bytes an image can hold
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// Accepted for symmetry with the other subcommands; capacity does
    /// not depend on the key.
    #[command(flatten)]
    pub key: KeyArgs,

    /// Carrier image to inspect
    #[arg(short = 'i', long = "in", value_name = "image file", required = true)]
    pub image: PathBuf,

    /// Restrict the estimate to noisy image regions
    #[arg(long)]
    pub noise_filter: bool,
}

impl CapacityArgs {
    pub fn run(self) -> CliResult<()> {
        let options = MethodOptions {
            noise_filter: self.noise_filter,
        };
        let capacity = stegokit_core::commands::carrier_capacity(&self.image, &options)?;
        println!("{capacity} bytes");
        Ok(())
    }
}
