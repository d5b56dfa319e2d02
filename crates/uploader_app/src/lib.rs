//! `sftp-batch` front end: argument parsing, presets, file selection and
//! terminal rendering around the upload engine.
pub mod cli;
pub mod commands;
pub mod console;
pub mod exit_codes;
pub mod files;
pub mod logging;
pub mod presets;
