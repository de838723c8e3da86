// Over-Under Contests terminal client library.
//
// Exposes the app orchestrator, protocol, and TUI so integration tests and
// the binary share the same code.

pub mod app;
pub mod notifications;
pub mod protocol;
pub mod tui;
