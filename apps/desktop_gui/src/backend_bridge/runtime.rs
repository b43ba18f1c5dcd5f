//! Backend worker thread: owns the tokio runtime, the HTTP client and the
//! session/task-list state, and executes queued UI commands.

use std::{path::PathBuf, sync::Arc, thread};

use client_core::{
    load_settings, load_settings_from, SessionProvider, SignUpOutcome, SupabaseClient,
    TaskListController,
};
use crossbeam_channel::{Receiver, Sender};
use shared::protocol::PasswordCredentials;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, config: Option<PathBuf>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let settings = match &config {
                Some(path) => load_settings_from(path),
                None => load_settings(),
            };
            let client = match SupabaseClient::new(&settings) {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err:#}"),
                    )));
                    tracing::error!(error = %format!("{err:#}"), "invalid backend settings");
                    return;
                }
            };

            let session = SessionProvider::new(client.clone());
            let controller = TaskListController::new(client, session.clone());
            let _listener = controller.spawn_session_listener();
            session.initialize().await;
            tracing::info!(url = %settings.supabase_url, "backend worker ready");

            let _ = ui_tx.try_send(UiEvent::BackendReady {
                session: session.clone(),
                controller: controller.clone(),
            });

            while let Ok(cmd) = cmd_rx.recv() {
                let session = session.clone();
                let controller = controller.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    execute(cmd, &session, &controller, &ui_tx).await;
                });
            }
            tracing::info!("ui command queue closed; backend worker stopping");
        });
    });
}

/// Task-list failures already land in the controller's alert slot; only
/// session failures need their own UI event.
async fn execute(
    cmd: BackendCommand,
    session: &SessionProvider,
    controller: &TaskListController,
    ui_tx: &Sender<UiEvent>,
) {
    let name = cmd.name();
    let task_result = match cmd {
        BackendCommand::SignIn { email, password } => {
            let credentials = PasswordCredentials::new(email, password);
            if let Err(err) = session.sign_in(&credentials).await {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::SignIn,
                    err.to_string(),
                )));
            }
            return;
        }
        BackendCommand::SignUp { email, password } => {
            let credentials = PasswordCredentials::new(email, password);
            match session.sign_up(&credentials).await {
                Ok(SignUpOutcome::SignedIn(_)) => {}
                Ok(SignUpOutcome::ConfirmationPending { email }) => {
                    let _ = ui_tx.try_send(UiEvent::SignUpPending { email });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::SignUp,
                        err.to_string(),
                    )));
                }
            }
            return;
        }
        BackendCommand::SignOut => {
            if let Err(err) = session.sign_out().await {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::SignOut,
                    err.to_string(),
                )));
            }
            return;
        }
        BackendCommand::RefreshTasks => controller.refresh().await,
        BackendCommand::AddTask => controller.submit_draft().await,
        BackendCommand::SaveEdit => controller.save_edit().await,
        BackendCommand::ConfirmDelete => controller.confirm_delete().await.map(|_| ()),
    };

    if let Err(err) = task_result {
        tracing::debug!(command = name, error = %err, "command finished with alert");
    }
}
