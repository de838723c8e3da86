// Library root for the entry client: form model, draft persistence, autosave
// controller and the display-side helpers (progress, countdown, search).

pub mod autosave;
pub mod config;
pub mod countdown;
pub mod error;
pub mod form;
pub mod progress;
pub mod search;
pub mod snapshot;
pub mod store;
pub mod transport;
