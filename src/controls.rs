use crate::classifier::{Category, ServerScope};
use crate::error::LogwatchError;
use crate::scheduler::RefreshRate;

/// User actions on the log view, read one per line from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    SetCategory(Category),
    SetServerScope(ServerScope),
    ListServers,
    ToggleRate,
    SetRate(RefreshRate),
    Clear,
    Refresh,
    Show,
    Hide,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  all | playback | error     choose the log category
  server <name|all>          limit to one source server
  servers                    list server scope options
  toggle | fast | normal     change auto-refresh cadence
  clear                      hide everything shown so far
  refresh                    fetch now
  hide | show                leave / re-enter the log view
  quit";

pub fn parse_command(line: &str) -> Result<ControlCommand, LogwatchError> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "all" | "playback" | "error" => ControlCommand::SetCategory(word.parse()?),
        "category" => ControlCommand::SetCategory(arg.parse()?),
        "server" => {
            if arg.is_empty() {
                return Err(LogwatchError::CommandError(
                    "Missing server name (use 'server all' to reset)".to_string(),
                ));
            }
            ControlCommand::SetServerScope(ServerScope::from(arg))
        }
        "servers" => ControlCommand::ListServers,
        "toggle" => ControlCommand::ToggleRate,
        "fast" => ControlCommand::SetRate(RefreshRate::Fast),
        "normal" => ControlCommand::SetRate(RefreshRate::Normal),
        "clear" => ControlCommand::Clear,
        "refresh" | "r" => ControlCommand::Refresh,
        "show" => ControlCommand::Show,
        "hide" => ControlCommand::Hide,
        "help" | "?" => ControlCommand::Help,
        "quit" | "exit" | "q" => ControlCommand::Quit,
        "" => return Err(LogwatchError::CommandError("Empty command".to_string())),
        other => {
            return Err(LogwatchError::CommandError(format!("Unknown command: {}", other)));
        }
    };

    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_shortcuts_and_long_form() {
        assert_eq!(parse_command("playback").unwrap(), ControlCommand::SetCategory(Category::Playback));
        assert_eq!(parse_command("  ERROR ").unwrap(), ControlCommand::SetCategory(Category::Error));
        assert_eq!(parse_command("category all").unwrap(), ControlCommand::SetCategory(Category::All));
        assert!(parse_command("category loud").is_err());
    }

    #[test]
    fn server_names_keep_case_and_spaces() {
        assert_eq!(
            parse_command("server Home Emby").unwrap(),
            ControlCommand::SetServerScope(ServerScope::Server("Home Emby".to_string()))
        );
        assert_eq!(parse_command("server all").unwrap(), ControlCommand::SetServerScope(ServerScope::All));
        assert!(parse_command("server").is_err());
    }

    #[test]
    fn cadence_and_lifecycle_commands() {
        assert_eq!(parse_command("toggle").unwrap(), ControlCommand::ToggleRate);
        assert_eq!(parse_command("fast").unwrap(), ControlCommand::SetRate(RefreshRate::Fast));
        assert_eq!(parse_command("clear").unwrap(), ControlCommand::Clear);
        assert_eq!(parse_command("hide").unwrap(), ControlCommand::Hide);
        assert_eq!(parse_command("q").unwrap(), ControlCommand::Quit);
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert!(matches!(parse_command("reboot"), Err(LogwatchError::CommandError(_))));
        assert!(parse_command("   ").is_err());
    }
}
