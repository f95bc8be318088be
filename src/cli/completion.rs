//! `hourgit completion` - shell completion scripts.

use std::fs;
use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::error::{Error, Result};

use super::{home_dir, Cli, CompletionCommands};

pub fn run(command: CompletionCommands) -> Result<()> {
    match command {
        CompletionCommands::Generate { shell } => {
            let shell = match shell {
                Some(name) => parse_shell(&name)?,
                None => detect_shell()?,
            };
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hourgit", &mut io::stdout());
            Ok(())
        }
        CompletionCommands::Install => install(),
    }
}

fn parse_shell(name: &str) -> Result<Shell> {
    name.parse::<Shell>()
        .map_err(|_| Error::InvalidArgument(format!("unsupported shell '{name}'")))
}

/// Detect the user's shell from `$SHELL`.
fn detect_shell() -> Result<Shell> {
    let shell = std::env::var("SHELL").unwrap_or_default();
    let name = shell.rsplit('/').next().unwrap_or("");
    match name {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(Error::OperationFailed(
            "could not detect shell from $SHELL; pass it explicitly".to_string(),
        )),
    }
}

/// Write the completion script to the conventional per-shell location.
fn install() -> Result<()> {
    let shell = detect_shell()?;
    let home = home_dir()?;

    let (dir, file) = match shell {
        Shell::Bash => (home.join(".bash_completion.d"), "hourgit".to_string()),
        Shell::Zsh => (home.join(".zsh/completions"), "_hourgit".to_string()),
        Shell::Fish => (
            home.join(".config/fish/completions"),
            "hourgit.fish".to_string(),
        ),
        Shell::Elvish => (home.join(".elvish/lib"), "hourgit.elv".to_string()),
        _ => {
            return Err(Error::OperationFailed(
                "automatic install is not supported for this shell".to_string(),
            ))
        }
    };

    fs::create_dir_all(&dir)?;
    let path = dir.join(file);

    let mut cmd = Cli::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, "hourgit", &mut buffer);
    fs::write(&path, buffer)?;

    println!("completion script installed to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_names_parse() {
        assert!(parse_shell("bash").is_ok());
        assert!(parse_shell("zsh").is_ok());
        assert!(parse_shell("fish").is_ok());
        assert!(parse_shell("tcsh").is_err());
    }
}
