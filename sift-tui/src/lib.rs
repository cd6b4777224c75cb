mod feeders;
mod form;
mod input;
mod styles;
mod table;
mod tui;
mod view;

pub use feeders::spawn_tui_feeders;
pub use tui::{TuiApp, TuiMsg, run};
