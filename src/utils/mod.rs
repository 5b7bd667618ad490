pub mod settings;

pub use settings::{WorldSettings, load_settings, save_settings};
