//! oh-my-dot shell feature manager.
//!
//! Each shell in a dotfiles repository keeps a manifest of features
//! (`omd-shells/<shell>/enabled.json`). The manifest, merged with an
//! optional untracked `enabled.local.json`, is compiled into one init
//! script per shell that loads every feature eagerly, in the background,
//! or on first use of a trigger command.
//!
//! The public API is organised into these layers:
//!
//! - **[`manifest`]**: feature model, option values, merge and trust policy
//! - **[`generate`]**: strategy categorizer and the per-dialect script backends
//! - **[`resources`]**: idempotent `check + apply` primitives (init script, profile hook)
//! - **[`workspace`]**: the per-repository pipeline behind every command
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod manifest;
pub mod platform;
pub mod resources;
pub mod shell;
pub mod workspace;
