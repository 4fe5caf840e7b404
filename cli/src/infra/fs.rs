//! Filesystem infrastructure: implements `UserDataSource` and `TemplateWriter`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{TemplateWriter, UserDataSource};

/// Production filesystem implementation of the file ports.
pub struct LocalFs;

impl UserDataSource for LocalFs {
    fn read_user_data(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }
}

impl TemplateWriter for LocalFs {
    fn write_template(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        // Write a sibling temp file, then rename over the target.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);
        std::fs::write(tmp, content).with_context(|| format!("writing file {}", tmp.display()))?;
        std::fs::rename(tmp, path).with_context(|| format!("renaming to {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "template written");
        Ok(())
    }
}
