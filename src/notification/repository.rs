use std::fs;
use std::path::PathBuf;

use super::model::Notification;

// one JSON array per profile, no versioning or migration
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> super::Result<Vec<Notification>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        let notifications = serde_json::from_str(&raw)?;
        Ok(notifications)
    }

    pub fn save(&self, notifications: &[Notification]) -> super::Result<()> {
        let raw = serde_json::to_string(notifications)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
