use std::sync::Arc;

use client_core::{format_created_date, SessionProvider, TaskListController, TaskListState};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Task;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiErrorCategory, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const CONTENT_MAX_WIDTH: f32 = 640.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
    Info,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginFocusField {
    Email,
    Password,
}

#[derive(Default)]
struct LoginUiState {
    focus: Option<LoginFocusField>,
    attempted_auto_focus: bool,
}

struct Backend {
    session: Arc<SessionProvider>,
    controller: Arc<TaskListController>,
}

pub struct TodoApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    backend: Option<Backend>,
    email: String,
    password: String,
    status: String,
    status_banner: Option<StatusBanner>,
    login_ui: LoginUiState,
    signed_in: bool,
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Auth => "Auth",
        UiErrorCategory::Transport => "Network",
        UiErrorCategory::Configuration => "Config",
        UiErrorCategory::Validation => "Input",
        UiErrorCategory::Unknown => "Error",
    }
}

impl TodoApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            backend: None,
            email: String::new(),
            password: String::new(),
            status: "Starting".to_string(),
            status_banner: None,
            login_ui: LoginUiState {
                focus: Some(LoginFocusField::Email),
                attempted_auto_focus: false,
            },
            signed_in: false,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::BackendReady {
                    session,
                    controller,
                } => {
                    self.status = "Ready".to_string();
                    self.backend = Some(Backend {
                        session,
                        controller,
                    });
                }
                UiEvent::SignUpPending { email } => {
                    let target = email.unwrap_or_else(|| "your inbox".to_string());
                    self.status = "Awaiting email confirmation".to_string();
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Info,
                        message: format!(
                            "Account created. Check {target} for a confirmation link, then sign in."
                        ),
                    });
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = format!("{}: {}", err_label(err.category()), err.message());
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: err.banner_text(),
                    });
                }
            }
        }
    }

    /// Keeps login form state in step with the session.
    fn track_session(&mut self, signed_in: bool) {
        if signed_in == self.signed_in {
            return;
        }
        self.signed_in = signed_in;
        if signed_in {
            self.password.clear();
            self.status = "Signed in".to_string();
            self.status_banner = None;
        } else {
            self.status = "Signed out".to_string();
            self.login_ui.focus = Some(LoginFocusField::Email);
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
                StatusBannerSeverity::Info => (
                    egui::Color32::from_rgb(44, 72, 104),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(92, 132, 178)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_loading_screen(&mut self, ctx: &egui::Context, caption: &str) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space((ui.available_height() * 0.3).max(24.0));
            ui.vertical_centered(|ui| {
                if self.status_banner.is_some() {
                    ui.set_width(ui.available_width().min(CONTENT_MAX_WIDTH));
                    self.show_status_banner(ui);
                } else {
                    ui.add(egui::Spinner::new().size(28.0));
                    ui.add_space(8.0);
                    ui.weak(caption);
                }
            });
        });
    }

    fn login_text_field(
        ui: &mut egui::Ui,
        id: &'static str,
        label: &str,
        hint: &str,
        value: &mut String,
        password: bool,
        should_focus: bool,
    ) -> egui::Response {
        ui.label(egui::RichText::new(label).strong());
        let edit = egui::TextEdit::singleline(value)
            .id_salt(id)
            .password(password)
            .hint_text(
                egui::RichText::new(hint)
                    .color(ui.visuals().weak_text_color().gamma_multiply(0.85)),
            )
            .desired_width(f32::INFINITY);

        let response = ui.add_sized([ui.available_width(), 34.0], edit);
        if should_focus {
            response.request_focus();
        }
        response
    }

    fn show_login_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(360.0, 480.0);
            ui.add_space((avail.y * 0.12).clamp(18.0, 90.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);

                egui::Frame::NONE
                    .fill(ui.visuals().faint_bg_color)
                    .corner_radius(14.0)
                    .stroke(egui::Stroke::new(
                        1.0,
                        ui.visuals().widgets.noninteractive.bg_stroke.color,
                    ))
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.style_mut().spacing.item_spacing = egui::vec2(10.0, 10.0);
                        ui.heading("My Tasks");
                        ui.weak("Sign in to see your tasks.");
                        ui.add_space(4.0);
                        self.show_status_banner(ui);

                        let mut focus_to_set = None;
                        if !self.login_ui.attempted_auto_focus {
                            self.login_ui.attempted_auto_focus = true;
                            focus_to_set = self.login_ui.focus.take();
                        } else if self.login_ui.focus.is_some() {
                            focus_to_set = self.login_ui.focus.take();
                        }

                        let email_resp = Self::login_text_field(
                            ui,
                            "login_email",
                            "Email",
                            "you@example.com",
                            &mut self.email,
                            false,
                            focus_to_set == Some(LoginFocusField::Email),
                        );
                        let password_resp = Self::login_text_field(
                            ui,
                            "login_password",
                            "Password",
                            "password",
                            &mut self.password,
                            true,
                            focus_to_set == Some(LoginFocusField::Password),
                        );

                        let enter_pressed = ctx.input(|i| i.key_pressed(egui::Key::Enter));
                        if enter_pressed && (email_resp.lost_focus() || password_resp.lost_focus())
                        {
                            self.try_sign_in(false);
                        }

                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            let width = (ui.available_width() - 10.0) / 2.0;
                            let sign_in = egui::Button::new(
                                egui::RichText::new("Sign In").strong().size(16.0),
                            )
                            .min_size(egui::vec2(width, 38.0));
                            if ui.add(sign_in).clicked() {
                                self.try_sign_in(false);
                            }
                            let sign_up = egui::Button::new(egui::RichText::new("Sign Up").size(16.0))
                                .min_size(egui::vec2(width, 38.0));
                            if ui.add(sign_up).clicked() {
                                self.try_sign_in(true);
                            }
                        });

                        ui.separator();
                        ui.horizontal_wrapped(|ui| {
                            ui.small("Status:");
                            ui.small(egui::RichText::new(&self.status).weak());
                        });
                    });
            });
        });
    }

    fn try_sign_in(&mut self, create_account: bool) {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: "Please enter your email.".to_string(),
            });
            self.login_ui.focus = Some(LoginFocusField::Email);
            return;
        }
        if self.password.is_empty() {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: "Please enter your password.".to_string(),
            });
            self.login_ui.focus = Some(LoginFocusField::Password);
            return;
        }

        self.status_banner = None;
        let password = self.password.clone();
        let cmd = if create_account {
            self.status = "Creating account...".to_string();
            BackendCommand::SignUp { email, password }
        } else {
            self.status = "Signing in...".to_string();
            BackendCommand::SignIn { email, password }
        };
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn show_header(&mut self, ctx: &egui::Context, state: &TaskListState) {
        egui::TopBottomPanel::top("tasks_header")
            .frame(
                egui::Frame::NONE
                    .fill(ctx.style().visuals.panel_fill)
                    .inner_margin(egui::Margin::symmetric(16, 10)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("My Tasks");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Sign Out").clicked() {
                            self.status = "Signing out...".to_string();
                            self.send(BackendCommand::SignOut);
                        }
                        let refresh = ui.add_enabled(!state.loading, egui::Button::new("Refresh"));
                        if refresh.clicked() {
                            self.send(BackendCommand::RefreshTasks);
                        }
                        if state.refreshing {
                            ui.add(egui::Spinner::new());
                        }
                    });
                });
            });
    }

    fn show_input(&mut self, ui: &mut egui::Ui, controller: &TaskListController, state: &TaskListState) {
        let mut draft = state.draft.clone();
        let response = ui.add(
            egui::TextEdit::multiline(&mut draft)
                .id_salt("new_task_input")
                .hint_text("Add a new task...")
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            controller.set_draft(draft);
        }
        ui.add_space(4.0);
        let add = egui::Button::new(egui::RichText::new("Add Task").strong())
            .min_size(egui::vec2(ui.available_width(), 32.0));
        if ui.add(add).clicked() {
            self.send(BackendCommand::AddTask);
        }
    }

    fn show_task_row(
        &mut self,
        ui: &mut egui::Ui,
        controller: &TaskListController,
        state: &TaskListState,
        task: &Task,
    ) {
        egui::Frame::new()
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(egui::CornerRadius::same(6))
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                match state.editing.as_ref().filter(|edit| edit.task_id == task.id) {
                    Some(edit) => {
                        let mut text = edit.text.clone();
                        let response = ui.add(
                            egui::TextEdit::multiline(&mut text)
                                .id_salt(("edit_task", task.id.as_str()))
                                .desired_rows(2)
                                .desired_width(f32::INFINITY),
                        );
                        if response.changed() {
                            controller.set_edit_text(text);
                        }
                        ui.horizontal(|ui| {
                            if ui.button("Save").clicked() {
                                self.send(BackendCommand::SaveEdit);
                            }
                            if ui.button("Cancel").clicked() {
                                controller.cancel_editing();
                            }
                        });
                    }
                    None => {
                        ui.horizontal(|ui| {
                            ui.vertical(|ui| {
                                ui.label(egui::RichText::new(&task.task_title).size(15.0));
                                ui.small(
                                    egui::RichText::new(format_created_date(&task.created_at))
                                        .weak(),
                                );
                            });
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.button("Delete").clicked() {
                                    controller.request_delete(task.id.clone());
                                }
                                if ui.button("Edit").clicked() {
                                    controller.start_editing(task);
                                }
                            });
                        });
                    }
                }
            });
    }

    fn show_tasks_screen(&mut self, ctx: &egui::Context, controller: &TaskListController) {
        let state = controller.snapshot();
        self.show_header(ctx, &state);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(CONTENT_MAX_WIDTH);
                ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                    self.show_input(ui, controller, &state);
                    ui.separator();

                    if state.shows_loading_indicator() {
                        ui.vertical_centered(|ui| {
                            ui.add_space(24.0);
                            ui.add(egui::Spinner::new().size(24.0));
                        });
                    } else if state.tasks.is_empty() {
                        ui.vertical_centered(|ui| {
                            ui.add_space(24.0);
                            ui.weak("No tasks yet. Add one above!");
                        });
                    } else {
                        egui::ScrollArea::vertical()
                            .id_salt("task_list_scroll")
                            .auto_shrink([false, false])
                            .show(ui, |ui| {
                                for task in &state.tasks {
                                    self.show_task_row(ui, controller, &state, task);
                                    ui.add_space(6.0);
                                }
                            });
                    }
                });
            });
        });

        if state.pending_delete.is_some() {
            self.show_delete_dialog(ctx, controller);
        }
        if let Some(alert) = &state.alert {
            egui::Window::new(alert.title.as_str())
                .id(egui::Id::new("task_alert"))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(alert.message.as_str());
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        controller.dismiss_alert();
                    }
                });
        }
    }

    fn show_delete_dialog(&mut self, ctx: &egui::Context, controller: &TaskListController) {
        egui::Window::new("Delete Task")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Are you sure you want to delete this task?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        controller.cancel_delete();
                    }
                    let delete = egui::Button::new(
                        egui::RichText::new("Delete").color(egui::Color32::WHITE),
                    )
                    .fill(egui::Color32::from_rgb(176, 58, 58));
                    if ui.add(delete).clicked() {
                        self.send(BackendCommand::ConfirmDelete);
                    }
                });
            });
    }
}

impl eframe::App for TodoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let handles = self
            .backend
            .as_ref()
            .map(|backend| (backend.session.clone(), backend.controller.clone()));
        match handles {
            None => self.show_loading_screen(ctx, "Starting backend..."),
            Some((session, controller)) => {
                let snapshot = session.snapshot();
                if snapshot.loading {
                    self.show_loading_screen(ctx, "Restoring session...");
                } else {
                    self.track_session(snapshot.user.is_some());
                    if snapshot.user.is_some() {
                        self.show_tasks_screen(ctx, &controller);
                    } else {
                        self.show_login_screen(ctx);
                    }
                }
            }
        }

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
