use std::path::{Path, PathBuf};

const ENV: &str = "ORDERKEEPER_ROOT";

pub struct ProjectDirs {
    pub app_config: PathBuf,
    pub keys_dir: PathBuf,
    pub root: PathBuf,
}

impl ProjectDirs {
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Self {
        let root = root_dir.as_ref().to_path_buf();

        Self {
            app_config: root.join("config.toml"),
            keys_dir: root.join("keys"),
            root,
        }
    }

    /// Resolves a keys file name relative to the keys directory.
    /// Explicit paths are returned as is
    pub fn keys_file<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        let name = name.as_ref();
        if name.components().count() > 1 || name.is_absolute() {
            name.to_path_buf()
        } else {
            self.keys_dir.join(name)
        }
    }

    pub fn default_root_dir() -> PathBuf {
        if let Ok(path) = std::env::var(ENV) {
            PathBuf::from(path)
        } else {
            default_root_dir()
        }
    }
}

fn default_root_dir() -> PathBuf {
    const DEFAULT_ROOT_DIR: &str = ".orderkeeper";

    match home::home_dir() {
        Some(home) => home.join(DEFAULT_ROOT_DIR),
        None => PathBuf::from(DEFAULT_ROOT_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_file_resolution() {
        let dirs = ProjectDirs::new("/tmp/orderkeeper");
        assert_eq!(dirs.app_config, Path::new("/tmp/orderkeeper/config.toml"));
        assert_eq!(
            dirs.keys_file("signer.keys.json"),
            Path::new("/tmp/orderkeeper/keys/signer.keys.json")
        );
        assert_eq!(
            dirs.keys_file("./signer.keys.json"),
            Path::new("./signer.keys.json")
        );
    }
}
