//! Renders structured log records as single human-readable lines.
//!
//! A record's message doubles as a template: backtick-delimited spans name
//! attributes to inline as `` `name:value` ``, values nest as groups
//! reachable through dotted paths, and any attribute the template never
//! references is appended in a trailing parenthesized group so nothing is
//! silently dropped. The [`layer`] module plugs the renderer into
//! `tracing_subscriber`; the [`expand`] and [`stamp`] modules are usable on
//! their own.

pub mod error;
pub mod expand;
pub mod header;
pub mod init;
pub mod layer;
pub mod record;
pub mod render;
pub mod stamp;
