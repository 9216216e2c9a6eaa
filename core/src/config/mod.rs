mod load;
mod types;

pub use load::{default_config_path, ensure_video_dir, load_default, load_from_path};
pub use types::{
    AppConfig, CaptureConfig, HttpConfig, LoggingConfig, StreamConfig, OUTPUT_PLACEHOLDER,
    SOURCE_PLACEHOLDER,
};
