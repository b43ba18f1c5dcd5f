use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    format_created_date, load_settings, load_settings_from, Alert, SessionProvider,
    SupabaseClient, TaskError, TaskListController,
};
use shared::{
    domain::{Task, TaskId},
    protocol::PasswordCredentials,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Manage your task list from the terminal")]
struct Args {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Settings file; defaults to todo.toml in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print all tasks, newest first.
    List,
    Add {
        title: String,
    },
    Edit {
        id: String,
        title: String,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    let client = Arc::new(SupabaseClient::new(&settings)?);
    let session = SessionProvider::new(client.clone());
    session.initialize().await;
    let user = session
        .sign_in(&PasswordCredentials::new(&args.email, &args.password))
        .await
        .context("sign-in failed")?;
    tracing::debug!(user_id = %user.id, "signed in");

    let controller = TaskListController::new(client, session.clone());
    let outcome = run(&controller, args.command).await;

    if let Err(err) = session.sign_out().await {
        tracing::warn!(error = %err, "sign-out failed");
    }

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            let alert = Alert::from(&err);
            eprintln!("{}: {}", alert.title, alert.message);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(controller: &TaskListController, command: Command) -> Result<(), TaskError> {
    controller.fetch_tasks().await?;

    match command {
        Command::List => {}
        Command::Add { title } => {
            controller.set_draft(title);
            controller.submit_draft().await?;
        }
        Command::Edit { id, title } => {
            let task = find_task(controller, &TaskId::new(id))?;
            controller.start_editing(&task);
            controller.set_edit_text(title);
            controller.save_edit().await?;
        }
        Command::Delete { id, yes } => {
            let task = find_task(controller, &TaskId::new(id))?;
            controller.request_delete(task.id.clone());
            let confirmed = yes
                || confirm(&format!(
                    "Delete Task\nAre you sure you want to delete this task? ({}) [y/N] ",
                    task.task_title
                ))
                .await
                .unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "could not read confirmation");
                    false
                });
            if confirmed {
                controller.confirm_delete().await?;
            } else {
                controller.cancel_delete();
                println!("Cancelled.");
            }
        }
    }

    print_tasks(&controller.snapshot().tasks);
    Ok(())
}

fn find_task(controller: &TaskListController, id: &TaskId) -> Result<Task, TaskError> {
    controller
        .snapshot()
        .task(id)
        .cloned()
        .ok_or_else(|| TaskError::Validation(format!("No task with id {id}")))
}

async fn confirm(prompt: &str) -> std::io::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks yet. Add one above!");
        return;
    }
    for task in tasks {
        println!("{}", task_line(task));
    }
}

fn task_line(task: &Task) -> String {
    format!(
        "{:>6}  {:>10}  {}",
        task.id,
        format_created_date(&task.created_at),
        task.task_title
    )
}
