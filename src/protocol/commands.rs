//! Module `commands`
//!
//! Defines the FTP verbs understood by the server, the raw command line
//! split into verb and arguments, and the typed command each verb becomes
//! once its arguments have been checked.

use crate::error::ProtocolError;

/// Verbs understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    User,
    Pass,
    Pwd,
    Cwd,
    Cdup,
    List,
    Retr,
    Stor,
    Dele,
    Mkd,
    Rmd,
    Quit,
}

impl Verb {
    pub const ALL: [Verb; 12] = [
        Verb::User,
        Verb::Pass,
        Verb::Pwd,
        Verb::Cwd,
        Verb::Cdup,
        Verb::List,
        Verb::Retr,
        Verb::Stor,
        Verb::Dele,
        Verb::Mkd,
        Verb::Rmd,
        Verb::Quit,
    ];

    /// Case-insensitive lookup of a verb token.
    pub fn from_token(token: &str) -> Option<Verb> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(token))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::User => "USER",
            Verb::Pass => "PASS",
            Verb::Pwd => "PWD",
            Verb::Cwd => "CWD",
            Verb::Cdup => "CDUP",
            Verb::List => "LIST",
            Verb::Retr => "RETR",
            Verb::Stor => "STOR",
            Verb::Dele => "DELE",
            Verb::Mkd => "MKD",
            Verb::Rmd => "RMD",
            Verb::Quit => "QUIT",
        }
    }

    /// Whether the verb may only be issued by an authenticated session.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Verb::User | Verb::Pass | Verb::Quit)
    }
}

/// A command line split into its verb token and arguments.
///
/// `args` holds the whitespace-separated tokens; `argument` is the whole
/// remainder of the line so that single-argument verbs accept names with
/// embedded spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub verb: String,
    pub args: Vec<String>,
    pub argument: String,
}

/// A fully validated FTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Pass(String),
    Pwd,
    Cwd(String),
    Cdup,
    List(Option<String>),
    Retr(String),
    Stor {
        filename: String,
        dest_dir: Option<String>,
    },
    Dele(String),
    Mkd(String),
    Rmd(String),
    Quit,
}

impl Command {
    /// Checks the argument count of `line` for `verb` and builds the command.
    pub fn from_line(verb: Verb, line: &CommandLine) -> Result<Command, ProtocolError> {
        let name = verb.as_str();
        let required = || {
            if line.argument.is_empty() {
                Err(ProtocolError::MissingArgument(name))
            } else {
                Ok(line.argument.clone())
            }
        };
        let none = |command: Command| {
            if line.args.is_empty() {
                Ok(command)
            } else {
                Err(ProtocolError::TooManyArguments(name))
            }
        };

        match verb {
            Verb::User => required().map(Command::User),
            Verb::Pass => required().map(Command::Pass),
            Verb::Cwd => required().map(Command::Cwd),
            Verb::Retr => required().map(Command::Retr),
            Verb::Dele => required().map(Command::Dele),
            Verb::Mkd => required().map(Command::Mkd),
            Verb::Rmd => required().map(Command::Rmd),
            Verb::List => Ok(Command::List(
                (!line.argument.is_empty()).then(|| line.argument.clone()),
            )),
            Verb::Stor => match line.args.as_slice() {
                [] => Err(ProtocolError::MissingArgument(name)),
                [filename] => Ok(Command::Stor {
                    filename: filename.clone(),
                    dest_dir: None,
                }),
                [filename, dest_dir] => Ok(Command::Stor {
                    filename: filename.clone(),
                    dest_dir: Some(dest_dir.clone()),
                }),
                _ => Err(ProtocolError::TooManyArguments(name)),
            },
            Verb::Pwd => none(Command::Pwd),
            Verb::Cdup => none(Command::Cdup),
            Verb::Quit => none(Command::Quit),
        }
    }
}
