pub mod settings;

// Re-export commonly used types
pub use settings::{
    load_settings, save_settings, AssetSettings, DataSourceSettings, LayoutSettings,
    PlazaSettings, SimulationSettings,
};
