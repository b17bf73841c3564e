pub use self::app_config::AppConfig;
pub use self::stored_keys::StoredKeys;

mod app_config;
mod stored_keys;
