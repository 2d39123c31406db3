//! Terminal commands. Each input line is parsed as one multicall command.

pub mod app;
pub mod auth;
pub mod chat;
pub mod upload;

use crate::AppState;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::AppError;
use secrecy::{ExposeSecret, Secret};
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct Repl {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Signup {
        first_name: String,
        last_name: String,
        email: String,
        /// Read from the terminal without echo
        #[arg(skip)]
        password: Option<Secret<String>>,
    },

    /// Sign in
    Login {
        email: String,
        /// Read from the terminal without echo
        #[arg(skip)]
        password: Option<Secret<String>>,
    },

    /// Sign out and forget uploaded documents and the conversation
    Logout,

    /// Upload a batch of documents, replacing the current set
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List uploaded documents and the last upload's state
    Docs,

    /// Open the chat once documents are processed
    Chat,

    /// Choose which documents questions are asked against
    Mode { mode: ModeArg },

    /// Check or uncheck documents for subset search
    Select {
        #[arg(required = true)]
        names: Vec<String>,
        /// Uncheck instead of check
        #[arg(long)]
        off: bool,
    },

    /// Pick the page for page search
    Page {
        number: String,
        /// Defaults to the first uploaded document
        #[arg(long)]
        document: Option<String>,
    },

    /// Include images in answers
    Images { switch: SwitchArg },

    /// Ask a question; the answer is printed when it arrives
    Ask {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Show the conversation so far
    History,

    /// Show session, documents and search options
    Status,

    /// Dump client metrics
    Metrics,

    /// Leave
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    All,
    Subset,
    Page,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchArg {
    On,
    Off,
}

pub enum Reply {
    Text(String),
    Quit,
}

/// Run one command. Answers to `ask` arrive later on `output`.
pub async fn dispatch(
    state: &AppState,
    command: Command,
    output: &mpsc::UnboundedSender<String>,
) -> Result<Reply, AppError> {
    let text = match command {
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            auth::signup(
                state,
                first_name,
                last_name,
                email,
                reveal(password),
            )
            .await?
        }
        Command::Login { email, password } => {
            auth::login(state, email, reveal(password)).await?
        }
        Command::Logout => auth::logout(state).await?,
        Command::Upload { paths } => upload::upload(state, paths).await?,
        Command::Docs => upload::docs(state),
        Command::Chat => chat::open(state)?,
        Command::Mode { mode } => chat::set_mode(state, mode).await?,
        Command::Select { names, off } => chat::select(state, names, !off).await?,
        Command::Page { number, document } => chat::page(state, number, document).await?,
        Command::Images { switch } => chat::images(state, switch == SwitchArg::On).await,
        Command::Ask { text } => chat::ask(state, text.join(" "), output.clone()).await?,
        Command::History => chat::history(state).await,
        Command::Status => app::status(state).await,
        Command::Metrics => app::metrics(),
        Command::Quit => return Ok(Reply::Quit),
    };

    Ok(Reply::Text(text))
}

fn reveal(password: Option<Secret<String>>) -> String {
    password
        .map(|p| p.expose_secret().clone())
        .unwrap_or_default()
}

/// Split an input line into arguments for `Repl::try_parse_from`, honouring
/// shell quoting so names with spaces survive.
pub fn split_line(line: &str) -> Result<Vec<String>, AppError> {
    shlex::split(line)
        .ok_or_else(|| AppError::InvalidInput("Unbalanced quotes in command".to_string()))
}
