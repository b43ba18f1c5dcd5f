//! UI layer for the desktop task list: sign-in screen, task screen, dialogs.

pub mod app;

pub use app::TodoApp;
