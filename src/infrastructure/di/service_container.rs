//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{RadiusService, TreeService};
use crate::config::Settings;
use crate::infrastructure::traits::{Editor, EnvironmentEditor, FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Editor abstraction
    pub editor: Arc<dyn Editor>,

    pub tree_service: TreeService,
    pub radius_service: RadiusService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let editor: Arc<dyn Editor> = match settings.editor.as_deref() {
            Some(cmd) => Arc::new(EnvironmentEditor::with_command(cmd)),
            None => Arc::new(EnvironmentEditor::default()),
        };
        Self::with_deps(settings, Arc::new(RealFileSystem), editor)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>, editor: Arc<dyn Editor>) -> Self {
        let settings = Arc::new(settings);
        let tree_service = TreeService::new(fs.clone());
        let radius_service = RadiusService::new(fs.clone());

        Self {
            settings,
            fs,
            editor,
            tree_service,
            radius_service,
        }
    }
}
