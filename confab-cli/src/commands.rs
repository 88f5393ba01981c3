//! Reserved words recognized by the chat prompt.
//!
//! Anything typed at the prompt that is not one of these words is sent to
//! the model as a question.

/// A reserved word and the action behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Cmd,
    Assistants,
    Langs,
    Models,
    Speak,
    History,
    Session,
    HistoryList,
    HistoryLoad,
    Reset,
    Save,
    Status,
    Log,
    Temperature,
    Limit,
    Confirm,
    Exit,
}

/// Menu order for the `cmd` picker.
pub const ALL: &[Command] = &[
    Command::Help,
    Command::Assistants,
    Command::Langs,
    Command::Models,
    Command::Speak,
    Command::History,
    Command::Session,
    Command::HistoryList,
    Command::HistoryLoad,
    Command::Reset,
    Command::Save,
    Command::Status,
    Command::Log,
    Command::Temperature,
    Command::Limit,
    Command::Confirm,
    Command::Exit,
];

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Cmd => "cmd",
            Self::Assistants => "assistants",
            Self::Langs => "langs",
            Self::Models => "models",
            Self::Speak => "speak",
            Self::History => "history",
            Self::Session => "session",
            Self::HistoryList => "historyList",
            Self::HistoryLoad => "historyLoad",
            Self::Reset => "reset",
            Self::Save => "save",
            Self::Status => "status",
            Self::Log => "log",
            Self::Temperature => "temperature",
            Self::Limit => "limit",
            Self::Confirm => "confirm",
            Self::Exit => "exit",
        }
    }

    /// One-line description shown next to the word in the `cmd` picker.
    pub fn description(self) -> &'static str {
        match self {
            Self::Help => "print the help message",
            Self::Cmd => "pick a command from a list",
            Self::Assistants => "select the assistant mode",
            Self::Langs => "select the target translation language",
            Self::Models => "select the model",
            Self::Speak => "speak the last answer out loud",
            Self::History => "print the readable Q&A history of this session",
            Self::Session => "print the detailed history with raw API payloads",
            Self::HistoryList => "list sessions stored in the vault",
            Self::HistoryLoad => "restore a stored session from the vault",
            Self::Reset => "clear the history, starting a fresh session",
            Self::Save => "save this session to the vault and start a fresh one",
            Self::Status => "show the current session status",
            Self::Log => "switch between silent and verbose logging",
            Self::Temperature => "set the sampling temperature",
            Self::Limit => "fetch the current API rate-limit headers",
            Self::Confirm => "switch input double-confirmation on or off",
            Self::Exit => "quit",
        }
    }

    /// Recognize a trimmed input line as a reserved word.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "help" => Some(Self::Help),
            "cmd" => Some(Self::Cmd),
            "assistants" => Some(Self::Assistants),
            "langs" => Some(Self::Langs),
            "models" => Some(Self::Models),
            "speak" => Some(Self::Speak),
            "history" => Some(Self::History),
            "session" => Some(Self::Session),
            "historyList" => Some(Self::HistoryList),
            "historyLoad" => Some(Self::HistoryLoad),
            "reset" => Some(Self::Reset),
            "save" => Some(Self::Save),
            "status" => Some(Self::Status),
            "log" => Some(Self::Log),
            "temperature" => Some(Self::Temperature),
            "limit" => Some(Self::Limit),
            "confirm" => Some(Self::Confirm),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// The banner printed at start-up and by `help`.
pub fn help_text() -> String {
    let mut help = String::new();
    help.push_str("Type anything to chat with the completion API.\n");
    help.push_str("A few reserved words act as commands:\n");
    help.push_str("  \"cmd\"          pick a command from a list\n");
    for command in ALL {
        if *command == Command::Cmd {
            continue;
        }
        help.push_str(&format!(
            "  {:<14} {}\n",
            format!("\"{}\"", command.as_str()),
            command.description()
        ));
    }
    help
}
