pub mod command_registry;
pub mod intent_parser;

pub use command_registry::{CommandHelp, CHAT_HELP_COMMANDS};
pub use intent_parser::{parse_intent, ChatIntent};
