pub mod refresh_job;

pub use refresh_job::{spawn_fetch, FetchOutcome};
