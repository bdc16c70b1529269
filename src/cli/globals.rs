use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub storage_path: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, storage_path: PathBuf) -> Self {
        Self {
            api_url,
            storage_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://app.tld".to_string(),
            PathBuf::from("/tmp/storage.json"),
        );
        assert_eq!(args.api_url, "https://app.tld");
        assert_eq!(args.storage_path, PathBuf::from("/tmp/storage.json"));
    }
}
