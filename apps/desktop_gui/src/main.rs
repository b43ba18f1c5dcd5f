use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::TodoApp;

#[derive(Parser, Debug)]
#[command(about = "Desktop client for a personal task list")]
struct Args {
    /// Settings file; defaults to todo.toml in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, args.config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("My Tasks")
            .with_inner_size([520.0, 760.0])
            .with_min_inner_size([380.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "My Tasks",
        options,
        Box::new(|_cc| Ok(Box::new(TodoApp::new(cmd_tx, ui_rx)))),
    )
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::backend_bridge::commands::BackendCommand;
    use super::controller::events::{
        classify_sign_in_failure, UiError, UiErrorCategory, UiErrorContext,
    };
    use super::controller::orchestration::dispatch_backend_command;

    #[test]
    fn classifies_rejected_credentials_as_auth_error() {
        let err = UiError::from_message(UiErrorContext::SignIn, "Invalid login credentials");
        assert_eq!(err.category(), UiErrorCategory::Auth);
        assert_eq!(err.banner_text(), "Sign-in failed: Invalid login credentials");
    }

    #[test]
    fn classifies_missing_anon_key_as_configuration_error() {
        let err = UiError::from_message(
            UiErrorContext::BackendStartup,
            "backend worker startup failure: anon key is not configured; set SUPABASE_ANON_KEY or anon_key in todo.toml",
        );
        assert_eq!(err.category(), UiErrorCategory::Configuration);
        assert!(err.banner_text().starts_with("Backend worker startup failure"));
    }

    #[test]
    fn classifies_unreachable_backend_as_transport_error() {
        let message = "transport failure: error sending request: connection refused";
        let err = UiError::from_message(UiErrorContext::SignIn, message);
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(
            classify_sign_in_failure(message),
            "Backend unreachable; check the project URL and network, then retry."
        );
    }

    #[test]
    fn sign_out_failure_is_reported_as_local_sign_out() {
        let err = UiError::from_message(UiErrorContext::SignOut, "transport failure: timed out");
        assert_eq!(err.context(), UiErrorContext::SignOut);
        assert!(err.banner_text().starts_with("Signed out locally"));
    }

    #[test]
    fn dispatch_reports_full_and_disconnected_queues() {
        let (tx, rx) = bounded::<BackendCommand>(1);
        let mut status = String::new();

        dispatch_backend_command(&tx, BackendCommand::RefreshTasks, &mut status);
        assert!(status.is_empty());
        dispatch_backend_command(&tx, BackendCommand::AddTask, &mut status);
        assert_eq!(status, "UI command queue is full; please retry");

        let queued = rx.try_recv().expect("queued command");
        assert_eq!(queued.name(), "refresh_tasks");

        drop(rx);
        dispatch_backend_command(&tx, BackendCommand::SignOut, &mut status);
        assert!(status.starts_with("Backend command processor disconnected"));
    }
}
