use std::path::PathBuf;

use super::command_registry::{CommandSpec, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_PATH_COMMANDS};
use crate::records::BudgetTier;

/// One line of interactive input, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatIntent {
    Noop,
    /// Plain text: a new design instruction for the next run.
    Instruction(String),
    Refine(String),
    SetStyle(String),
    SetBudget(BudgetTier),
    SetImage(PathBuf),
    Show,
    Presets,
    Help,
    Quit,
    Invalid { command: String, reason: String },
    Unknown { command: String, arg: String },
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

// Unquoted paths with spaces arrive split; join them back.
fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

fn invalid(command: &str, reason: impl Into<String>) -> ChatIntent {
    ChatIntent::Invalid {
        command: command.to_string(),
        reason: reason.into(),
    }
}

fn raw_arg_intent(command: &str, action: &str, arg: &str) -> ChatIntent {
    if arg.is_empty() {
        return invalid(command, format!("/{command} needs an argument"));
    }
    match action {
        "refine" => ChatIntent::Refine(arg.to_string()),
        "set_style" => ChatIntent::SetStyle(arg.to_string()),
        "set_budget" => match arg.parse::<BudgetTier>() {
            Ok(tier) => ChatIntent::SetBudget(tier),
            Err(err) => invalid(command, err.to_string()),
        },
        _ => ChatIntent::Unknown {
            command: command.to_string(),
            arg: arg.to_string(),
        },
    }
}

fn no_arg_intent(action: &str) -> ChatIntent {
    match action {
        "show" => ChatIntent::Show,
        "presets" => ChatIntent::Presets,
        "help" => ChatIntent::Help,
        _ => ChatIntent::Quit,
    }
}

pub fn parse_intent(text: &str) -> ChatIntent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatIntent::Noop;
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                return raw_arg_intent(&command, action, arg);
            }

            if find_action(&command, SINGLE_PATH_COMMANDS).is_some() {
                let path = parse_single_path_arg(arg);
                if path.is_empty() {
                    return invalid(&command, "/image needs a path");
                }
                return ChatIntent::SetImage(PathBuf::from(path));
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return no_arg_intent(action);
            }

            return ChatIntent::Unknown {
                command,
                arg: arg.to_string(),
            };
        }
    }

    ChatIntent::Instruction(raw_trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{parse_intent, ChatIntent};
    use crate::records::BudgetTier;

    #[test]
    fn plain_text_is_an_instruction() {
        assert_eq!(
            parse_intent("  add a reading lamp  "),
            ChatIntent::Instruction("add a reading lamp".to_string())
        );
        assert_eq!(parse_intent("   "), ChatIntent::Noop);
    }

    #[test]
    fn parse_refine_and_style() {
        assert_eq!(
            parse_intent("/refine make the walls sage green"),
            ChatIntent::Refine("make the walls sage green".to_string())
        );
        assert_eq!(
            parse_intent("/STYLE Coastal"),
            ChatIntent::SetStyle("Coastal".to_string())
        );
        assert!(matches!(
            parse_intent("/refine"),
            ChatIntent::Invalid { command, .. } if command == "refine"
        ));
    }

    #[test]
    fn parse_budget_accepts_names_and_menu_numbers() {
        assert_eq!(
            parse_intent("/budget high"),
            ChatIntent::SetBudget(BudgetTier::High)
        );
        assert_eq!(
            parse_intent("/budget 1"),
            ChatIntent::SetBudget(BudgetTier::Low)
        );
        assert!(matches!(
            parse_intent("/budget lavish"),
            ChatIntent::Invalid { .. }
        ));
    }

    #[test]
    fn parse_image_quoted_and_bare_paths() {
        assert_eq!(
            parse_intent("/image \"/tmp/living room.jpg\""),
            ChatIntent::SetImage(PathBuf::from("/tmp/living room.jpg"))
        );
        assert_eq!(
            parse_intent("/image photos/a b.png"),
            ChatIntent::SetImage(PathBuf::from("photos/a b.png"))
        );
        assert!(matches!(parse_intent("/image"), ChatIntent::Invalid { .. }));
    }

    #[test]
    fn parse_no_arg_commands_and_aliases() {
        assert_eq!(parse_intent("/show"), ChatIntent::Show);
        assert_eq!(parse_intent("/presets"), ChatIntent::Presets);
        assert_eq!(parse_intent("/help"), ChatIntent::Help);
        assert_eq!(parse_intent("/quit"), ChatIntent::Quit);
        assert_eq!(parse_intent("/exit"), ChatIntent::Quit);
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(
            parse_intent("/magic foo bar"),
            ChatIntent::Unknown {
                command: "magic".to_string(),
                arg: "foo bar".to_string()
            }
        );
    }
}
