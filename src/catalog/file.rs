//! YAML-file-backed channel catalog.
//!
//! The catalog lives in a single `channels.yml` under the catalog directory.
//! Writes go through the write-to-temp-then-rename pattern so the file is
//! never left partially written.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{CatalogProvider, Channel, ChannelCatalog, ChannelRef, LogSink, Probe};

/// Name of the catalog file inside the catalog directory.
pub const CATALOG_FILE_NAME: &str = "channels.yml";

/// On-disk catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogDoc {
    /// Schema version for migration.
    version: u32,

    /// When the catalog was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<DateTime<Utc>>,

    /// Channel entries, in file order.
    #[serde(default)]
    channels: Vec<ChannelEntry>,
}

impl CatalogDoc {
    const CURRENT_VERSION: u32 = 1;

    fn empty() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            updated: None,
            channels: Vec::new(),
        }
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Channel name, unique within the catalog.
    pub name: String,

    /// Where the channel's content is served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the channel participates in update operations.
    pub active: bool,
}

impl ChannelEntry {
    /// A new active channel with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: None,
            description: None,
            active: true,
        }
    }

    /// Builder-style URL setter.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Builder-style activation setter.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

impl Channel for ChannelEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> Probe<bool> {
        Probe::Hit(self.active)
    }

    fn set_active(&mut self, active: bool) -> Probe<()> {
        self.active = active;
        Probe::Hit(())
    }

    fn active_field(&self) -> Probe<bool> {
        Probe::Hit(self.active)
    }

    fn active_field_mut(&mut self) -> Probe<&mut bool> {
        Probe::Hit(&mut self.active)
    }
}

/// File-backed catalog supporting every current API shape.
pub struct FileCatalog {
    path: PathBuf,
    doc: CatalogDoc,
    log: Option<Arc<dyn LogSink>>,
}

impl FileCatalog {
    /// Open a catalog rooted at `location`. Contents are not loaded until
    /// [`ChannelCatalog::read`].
    pub fn open(location: &Path) -> Self {
        Self {
            path: location.join(CATALOG_FILE_NAME),
            doc: CatalogDoc::empty(),
            log: None,
        }
    }

    /// Open with a log sink attached (the richer constructor shape).
    pub fn open_with_log(location: &Path, log: Arc<dyn LogSink>) -> Self {
        Self {
            path: location.join(CATALOG_FILE_NAME),
            doc: CatalogDoc::empty(),
            log: Some(log),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create or replace the catalog file at `location` with the given
    /// entries. Used by installers and test setup.
    pub fn seed(location: &Path, channels: Vec<ChannelEntry>) -> anyhow::Result<()> {
        let catalog = FileCatalog {
            path: location.join(CATALOG_FILE_NAME),
            doc: CatalogDoc {
                version: CatalogDoc::CURRENT_VERSION,
                updated: Some(Utc::now()),
                channels,
            },
            log: None,
        };
        catalog.write()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.doc.channels.iter().position(|c| c.name == name)
    }

    fn log_debug(&self, msg: &str) {
        if let Some(log) = &self.log {
            log.debug(msg);
        }
    }
}

impl ChannelCatalog for FileCatalog {
    fn read(&mut self) -> anyhow::Result<()> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("could not read catalog at {}", self.path.display()))?;
        self.doc = serde_yaml::from_str(&content)
            .with_context(|| format!("malformed catalog at {}", self.path.display()))?;
        self.log_debug(&format!(
            "loaded {} channel(s) from {}",
            self.doc.channels.len(),
            self.path.display()
        ));
        Ok(())
    }

    fn find_filtered(&self, name: &str, include_inactive: bool) -> Probe<Option<ChannelRef>> {
        let found = self
            .position(name)
            .filter(|&i| include_inactive || self.doc.channels[i].active)
            .map(ChannelRef::new);
        Probe::Hit(found)
    }

    fn find(&self, name: &str) -> Probe<Option<ChannelRef>> {
        // Historical single-argument shape: active entries only.
        self.find_filtered(name, false)
    }

    fn set_channel_active(&mut self, handle: &ChannelRef, active: bool) -> Probe<anyhow::Result<()>> {
        let result = match self.doc.channels.get_mut(handle.slot()) {
            Some(entry) => {
                entry.active = active;
                Ok(())
            }
            None => Err(anyhow!("stale channel handle: slot {}", handle.slot())),
        };
        Probe::Hit(result)
    }

    fn channel_mut(&mut self, handle: &ChannelRef) -> Option<&mut dyn Channel> {
        self.doc
            .channels
            .get_mut(handle.slot())
            .map(|entry| entry as &mut dyn Channel)
    }

    fn write(&self) -> anyhow::Result<()> {
        let mut doc = self.doc.clone();
        doc.updated = Some(Utc::now());
        let content = serde_yaml::to_string(&doc).context("could not serialize catalog")?;

        // Atomic write: temp file then rename, so a crash mid-write never
        // corrupts the catalog.
        let temp_path = self.path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)
            .with_context(|| format!("could not write {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("could not replace {}", self.path.display()))?;
        self.log_debug(&format!("persisted catalog to {}", self.path.display()));
        Ok(())
    }
}

/// Provider exposing both constructor shapes over [`FileCatalog`].
#[derive(Debug, Clone, Default)]
pub struct FileCatalogProvider;

impl CatalogProvider for FileCatalogProvider {
    fn open_with_log(
        &self,
        location: &Path,
        log: Arc<dyn LogSink>,
    ) -> Probe<anyhow::Result<Box<dyn ChannelCatalog>>> {
        Probe::Hit(Ok(Box::new(FileCatalog::open_with_log(location, log))))
    }

    fn open(&self, location: &Path) -> Probe<anyhow::Result<Box<dyn ChannelCatalog>>> {
        Probe::Hit(Ok(Box::new(FileCatalog::open(location))))
    }
}
