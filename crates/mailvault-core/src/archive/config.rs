//! Archive configuration types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use super::ArchiveError;

/// Directory layout below the archive root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// `root/YYYY-MM/DD`, computed from the open time.
    #[default]
    Dated,
    /// Everything directly in `root`.
    Flat,
}

/// Archive configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Archive root directory.
    pub root: PathBuf,
    /// Directory layout below the root.
    pub layout: Layout,
}

impl ArchiveConfig {
    /// Creates a configuration with the dated layout.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: Layout::Dated,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(root: impl Into<PathBuf>) -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::new(root)
    }

    /// Returns the bucket directory for an archive opened at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::RootNotSet`] if the root path is empty.
    pub fn bucket(&self, now: &DateTime<FixedOffset>) -> Result<PathBuf, ArchiveError> {
        if self.root.as_os_str().is_empty() {
            return Err(ArchiveError::RootNotSet);
        }

        Ok(match self.layout {
            Layout::Flat => self.root.clone(),
            Layout::Dated => self
                .root
                .join(now.format("%Y-%m").to_string())
                .join(now.format("%d").to_string()),
        })
    }

    /// Returns the archive root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Builder for archive configuration.
#[derive(Debug, Clone)]
pub struct ArchiveConfigBuilder {
    root: PathBuf,
    layout: Layout,
}

impl ArchiveConfigBuilder {
    /// Creates a new builder for the given root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: Layout::Dated,
        }
    }

    /// Sets the layout.
    #[must_use]
    pub const fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Uses the flat layout when `flat` is true.
    #[must_use]
    pub const fn flat(self, flat: bool) -> Self {
        if flat { self.layout(Layout::Flat) } else { self }
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ArchiveConfig {
        ArchiveConfig {
            root: self.root,
            layout: self.layout,
        }
    }
}
