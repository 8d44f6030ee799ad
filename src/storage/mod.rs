//! Storage module for persisted state and configuration.

pub mod config;
pub mod store;

pub use config::{
    AppConfig, HeadwindSettings, HeadwindStats, TimingSettings, WidgetSettings,
    WindDirectionIndicatorSetting, WindDirectionIndicatorTextSetting,
};
pub use store::{Store, StoreError, StoreKey};
