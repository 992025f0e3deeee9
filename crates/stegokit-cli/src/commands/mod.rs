pub mod capacity;
pub mod embed;
pub mod extract;

use std::fs;
use std::path::PathBuf;

use clap::Args;
use stegokit_core::StegoError;

use crate::CliResult;

/// Key sources, in precedence order: inline flag, key file, interactive
/// prompt.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Key used to encrypt and address the hidden data
    #[arg(short = 'k', long = "key", value_name = "key")]
    pub key: Option<String>,

    /// Read the key from the first line of this file
    #[arg(long = "key-file", value_name = "key file", conflicts_with = "key")]
    pub key_file: Option<PathBuf>,
}

impl KeyArgs {
    /// Resolves the key, prompting on the terminal when neither flag was
    /// given. Embedding asks for a confirmation to catch typos; a mistyped
    /// extraction key fails loudly anyway.
    pub fn resolve(&self, confirm: bool) -> CliResult<String> {
        if let Some(key) = &self.key {
            return Ok(key.clone());
        }
        if let Some(path) = &self.key_file {
            let content =
                fs::read_to_string(path).map_err(|source| StegoError::ReadError { source })?;
            return Ok(content.lines().next().unwrap_or("").trim().to_owned());
        }

        let mut prompt = dialoguer::Password::new().with_prompt("Key");
        if confirm {
            prompt = prompt.with_confirmation("Confirm key", "Keys do not match");
        }
        prompt.interact().map_err(|error| match error {
            dialoguer::Error::IO(source) => StegoError::IoError(source),
        })
    }
}
