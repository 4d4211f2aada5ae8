#[macro_use]
extern crate tracing;

mod app_config;
mod hub;
mod sheet;

pub use app_config::{
    get_config_dir,
    get_data_dir,
};
pub use hub::{
    HubArgs,
    HubConfig,
};
pub use sheet::{
    ExportMode,
    LayoutMode,
    SheetConfig,
};
