#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "refine",
        action: "refine",
    },
    CommandSpec {
        command: "style",
        action: "set_style",
    },
    CommandSpec {
        command: "budget",
        action: "set_budget",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "image",
    action: "set_image",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "show",
        action: "show",
    },
    CommandSpec {
        command: "presets",
        action: "presets",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
    CommandSpec {
        command: "q",
        action: "quit",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub summary: &'static str,
}

pub const CHAT_HELP_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        usage: "/refine <text>",
        summary: "refine the current design with feedback",
    },
    CommandHelp {
        usage: "/style <name>",
        summary: "change the target style for the next run",
    },
    CommandHelp {
        usage: "/budget <low|moderate|high>",
        summary: "change the budget tier",
    },
    CommandHelp {
        usage: "/image <path>",
        summary: "switch to another room photo",
    },
    CommandHelp {
        usage: "/show",
        summary: "print the current plan and rendering",
    },
    CommandHelp {
        usage: "/presets",
        summary: "list style presets and quick styles",
    },
    CommandHelp {
        usage: "/help",
        summary: "show this list",
    },
    CommandHelp {
        usage: "/quit",
        summary: "leave the session",
    },
];
