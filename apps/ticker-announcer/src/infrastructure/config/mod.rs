//! Configuration loading.

mod settings;

pub use settings::{
    AnnouncerConfig, BroadcastSettings, QuoteApiSettings, ServerSettings, TickerSettings,
};
