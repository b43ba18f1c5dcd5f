//! Backend commands queued from UI to backend worker.

pub enum BackendCommand {
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    SignOut,
    RefreshTasks,
    /// Adds whatever is in the input draft when the worker picks it up.
    AddTask,
    SaveEdit,
    ConfirmDelete,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignIn { .. } => "sign_in",
            Self::SignUp { .. } => "sign_up",
            Self::SignOut => "sign_out",
            Self::RefreshTasks => "refresh_tasks",
            Self::AddTask => "add_task",
            Self::SaveEdit => "save_edit",
            Self::ConfirmDelete => "confirm_delete",
        }
    }
}
