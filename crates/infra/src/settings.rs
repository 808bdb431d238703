//! Capture settings held in memory

use gasoline_core::SettingsProvider;
use gasoline_domain::CaptureSettings;
use parking_lot::RwLock;

/// [`SettingsProvider`] over a value that can be replaced at runtime.
#[derive(Debug, Default)]
pub struct StaticSettings {
    current: RwLock<CaptureSettings>,
}

impl StaticSettings {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { current: RwLock::new(settings) }
    }

    /// Edit the settings in place; the next sync cycle reports the change.
    pub fn update(&self, change: impl FnOnce(&mut CaptureSettings)) {
        change(&mut *self.current.write());
    }
}

impl SettingsProvider for StaticSettings {
    fn capture_settings(&self) -> CaptureSettings {
        self.current.read().clone()
    }
}
