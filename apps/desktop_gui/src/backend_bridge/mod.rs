//! Backend bridge: command definitions and the worker thread that executes them.

pub mod commands;
pub mod runtime;
