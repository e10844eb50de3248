// Command handlers module
pub mod health;
pub mod optimize;
pub mod platform;
pub mod processes;
pub mod stats;
pub mod version;

use anyhow::{bail, Result};
use colored::*;
use serde::Serialize;

use crate::core::ActionResponse;

/// How command results reach the terminal
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or hand it to `render` for the human view
    pub fn emit<T, F>(&self, value: &T, render: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce(&T),
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }

    /// Print a mutation result; a failed action becomes a non-zero exit
    pub fn respond(&self, response: ActionResponse) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else if response.success {
            println!("{} {}", "✓".green(), response.message);
            if response.needs_restart {
                println!("  {}", "A restart is required for this change to take effect".yellow());
            }
        } else {
            eprintln!("{} {}", "✗".red(), response.message);
        }

        if !response.success {
            bail!("operation failed");
        }
        Ok(())
    }
}
