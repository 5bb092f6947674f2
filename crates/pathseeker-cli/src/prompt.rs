//! Line-oriented terminal prompts.

use std::io::{self, Write};

use anyhow::Result;

/// Read one trimmed line after printing `label`
pub fn line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Like `line`, but an empty answer falls back to `default`
pub fn line_or(label: &str, default: &str) -> Result<String> {
    let input = if default.is_empty() {
        line(&format!("{}: ", label))?
    } else {
        line(&format!("{} [{}]: ", label, default))?
    };
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

pub fn password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(label)?)
}
