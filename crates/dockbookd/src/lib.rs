//! dockbookd — the dockbook daemon.
//!
//! Startup is an ordered, fallible sequence:
//!
//! ```text
//! ConfigArgs::load()      defaults ← dockbook.toml ← env / flags
//!   → startup::prepare()  resolve store endpoint → build adapter → bind address
//!   → startup::serve()    axum on the bound listener until shutdown
//! ```
//!
//! Any failure before `serve` aborts the process without opening a
//! listener.

pub mod cli;
pub mod startup;
