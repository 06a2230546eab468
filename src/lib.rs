pub mod app;
pub mod cache;
pub mod calendar;
pub mod entries;
pub mod errors;
pub mod handlers;
pub mod holidays;
pub mod models;
pub mod report;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
