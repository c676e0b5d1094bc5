//! `ls` - print a user's numbered listing.

use filerelay::registry::FileRegistry;
use filerelay::storage::{Storage, UserId};

use crate::error::CliError;
use crate::runner::CliRunner;

pub fn run(runner: &CliRunner, user: u64) -> Result<(), CliError> {
    let registry = FileRegistry::new(Storage::new(&runner.config().storage_root));
    let listing = registry.list(UserId(user))?;
    println!("{}", listing.text);
    Ok(())
}
