mod settings;

pub use settings::{CacheConfig, CompilerConfig, LogConfig, RenderConfig, Settings};
