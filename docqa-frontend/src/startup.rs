use crate::config::Settings;
use crate::handlers::{dispatch, split_line, Command, Reply, Repl};
use crate::models::Notification;
use crate::utils::render::render_notification;
use crate::AppState;
use anyhow::Context;
use clap::Parser;
use client_core::AppError;
use secrecy::Secret;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

const BANNER: &str = "docqa: ask questions about your documents. Type `help` for commands.";

/// Build the shared state and the receiving end of the notification channel.
pub fn build_state(
    settings: &Settings,
) -> Result<(AppState, mpsc::UnboundedReceiver<Notification>), AppError> {
    let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
    let state = AppState::new(settings, notifications_tx)?;
    Ok((state, notifications_rx))
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let (state, notifications) = build_state(&settings)?;
    tracing::info!(backend = %state.backend.base_url(), "Client ready");

    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(
        notifications,
        output_rx,
        state.session.subscribe_screen(),
    ));

    println!("{}", BANNER);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let args = match split_line(&line) {
            Ok(args) if args.is_empty() => continue,
            Ok(args) => args,
            Err(e) => {
                println!("Error: {}", e);
                continue;
            }
        };

        let command = match Repl::try_parse_from(args) {
            Ok(repl) => repl.command,
            Err(e) => {
                println!("{}", e.render());
                continue;
            }
        };
        let command = match with_password(command).await {
            Ok(command) => command,
            Err(e) => {
                println!("Error: {:#}", e);
                continue;
            }
        };

        match dispatch(&state, command, &output_tx).await {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Command failed");
                println!("Error: {}", e);
            }
        }
    }

    printer.abort();
    tracing::info!("Client stopped");
    Ok(())
}

/// Fill in the password for login and signup, read from the terminal without echo.
async fn with_password(command: Command) -> anyhow::Result<Command> {
    let needs_password = matches!(
        command,
        Command::Login { password: None, .. } | Command::Signup { password: None, .. }
    );
    if !needs_password {
        return Ok(command);
    }

    let password = tokio::task::spawn_blocking(|| rpassword::prompt_password("password: "))
        .await
        .context("Password prompt was interrupted")?
        .context("Failed to read password")?;
    let password = Some(Secret::new(password));

    Ok(match command {
        Command::Login { email, .. } => Command::Login { email, password },
        Command::Signup {
            first_name,
            last_name,
            email,
            ..
        } => Command::Signup {
            first_name,
            last_name,
            email,
            password,
        },
        other => other,
    })
}

async fn print_events(
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    mut output: mpsc::UnboundedReceiver<String>,
    mut screens: watch::Receiver<crate::models::Screen>,
) {
    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => {
                println!("{}", render_notification(&notification));
            }
            Some(text) = output.recv() => {
                println!("\n{}", text);
                prompt("> ");
            }
            Ok(()) = screens.changed() => {
                let screen = *screens.borrow_and_update();
                println!("[screen: {:?}]", screen);
            }
            else => break,
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}
