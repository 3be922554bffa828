//! Data-dictionary tree builder and per-level ring sizing for radial tree layouts.
//!
//! Layers, innermost first: [`domain`] (tree model, statistics, radius engine,
//! record coercion), [`application`] (services and report rendering),
//! [`infrastructure`] (I/O boundary and wiring) and [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
