use std::process::Command;

use crossterm::style::Stylize;
use tracing::{info, warn};

use crate::i18n::{Language, MessageKey, t};

const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

fn install_command(sudo: bool) -> Vec<&'static str> {
    let mut argv = Vec::with_capacity(5);
    if sudo {
        argv.push("sudo");
    }
    argv.extend(["cargo", "install", "--force", PACKAGE_NAME]);
    argv
}

/// Reinstalls the latest release through cargo. A failing install is reported
/// by cargo itself on the inherited stderr.
pub fn run(sudo: bool, lang: Language) {
    let argv = install_command(sudo);
    let shown = argv.join(" ");

    println!();
    println!("{}", format!("{}: {shown}", t(&lang, MessageKey::Running)).dim());
    println!();

    match Command::new(argv[0]).args(&argv[1..]).status() {
        Ok(status) if status.success() => info!(command = %shown, "update finished"),
        Ok(status) => warn!(command = %shown, %status, "update command failed"),
        Err(err) => warn!(command = %shown, error = %err, "failed to spawn update command"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_command() {
        assert_eq!(
            install_command(false),
            vec!["cargo", "install", "--force", "ai-chat"]
        );
        assert_eq!(install_command(true)[0], "sudo");
        assert_eq!(install_command(true).len(), 5);
    }

    #[test]
    fn test_install_command_line_is_shown_joined() {
        assert_eq!(install_command(false).join(" "), "cargo install --force ai-chat");
        assert_eq!(
            install_command(true).join(" "),
            "sudo cargo install --force ai-chat"
        );
    }
}
