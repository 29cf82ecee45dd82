//! Theme preference and color palettes
//!
//! The user picks `light`, `dark` or `system`. In `system` mode the palette
//! follows the scheme reported by the OS; an unknown scheme resolves to
//! light. The preference is persisted under `themeMode` on every change.
//!
//! # Usage
//!
//! ```rust
//! use app_ui::theme::{ColorScheme, ThemeMode, ThemeStore};
//! use std::sync::Arc;
//! use storage::KvStore;
//!
//! let store = ThemeStore::new(Arc::new(KvStore::in_memory().unwrap()));
//! store.set_system_scheme(Some(ColorScheme::Dark));
//! assert!(store.is_dark());
//!
//! store.set_mode(ThemeMode::Light);
//! assert_eq!(store.colors().background, "#FFFFFF");
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, KeyValueStore, KeyValueStoreExt};
use tokio::sync::watch;

// =============================================================================
// Color Types
// =============================================================================

/// A color as a `#RRGGBB` hex string
pub type Color = &'static str;

/// Parse a hex color string to RGB components
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() < 6 || !hex.is_char_boundary(6) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Named colors used across the screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeColors {
    /// Screen background
    pub background: Color,
    /// Card surface
    pub card: Color,
    /// Body text
    pub text: Color,
    /// Secondary text
    pub subtext: Color,
    /// Primary accent
    pub primary: Color,
    /// Secondary accent
    pub secondary: Color,
    /// Dividers and outlines
    pub border: Color,
    /// Error state
    pub error: Color,
    /// Success state
    pub success: Color,
}

/// Light palette
pub const LIGHT_COLORS: ThemeColors = ThemeColors {
    background: "#FFFFFF",
    card: "#F5F5F5",
    text: "#121212",
    subtext: "#666666",
    primary: "#8A2BE2",
    secondary: "#6A1CB2",
    border: "#E0E0E0",
    error: "#FF3B30",
    success: "#34C759",
};

/// Dark palette
pub const DARK_COLORS: ThemeColors = ThemeColors {
    background: "#121212",
    card: "#1E1E1E",
    text: "#FFFFFF",
    subtext: "#BBBBBB",
    primary: "#8A2BE2",
    secondary: "#9D4EDD",
    border: "#333333",
    error: "#FF453A",
    success: "#30D158",
};

// =============================================================================
// Theme Mode
// =============================================================================

/// User theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the OS
    #[default]
    System,
}

impl ThemeMode {
    /// All modes in menu order
    pub fn all() -> [ThemeMode; 3] {
        [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System]
    }

    /// Stored identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "Light"),
            ThemeMode::Dark => write!(f, "Dark"),
            ThemeMode::System => write!(f, "System"),
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            _ => Err(format!("Unknown theme mode: {}", s)),
        }
    }
}

/// Scheme reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light appearance
    Light,
    /// Dark appearance
    Dark,
}

impl std::str::FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(ColorScheme::Light),
            "dark" => Ok(ColorScheme::Dark),
            _ => Err(format!("Unknown color scheme: {}", s)),
        }
    }
}

/// Whether `mode` renders dark given the OS scheme
pub fn resolve_dark(mode: ThemeMode, system: Option<ColorScheme>) -> bool {
    match mode {
        ThemeMode::Light => false,
        ThemeMode::Dark => true,
        ThemeMode::System => system == Some(ColorScheme::Dark),
    }
}

/// Effective theme at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeSnapshot {
    /// Chosen mode
    pub mode: ThemeMode,
    /// Last scheme reported by the OS
    pub system_scheme: Option<ColorScheme>,
    /// Whether the dark palette is active
    pub is_dark: bool,
    /// Active palette
    pub colors: ThemeColors,
}

impl ThemeSnapshot {
    fn new(mode: ThemeMode, system_scheme: Option<ColorScheme>) -> Self {
        let is_dark = resolve_dark(mode, system_scheme);
        Self {
            mode,
            system_scheme,
            is_dark,
            colors: if is_dark { DARK_COLORS } else { LIGHT_COLORS },
        }
    }
}

// =============================================================================
// Theme Store
// =============================================================================

/// Theme provider state
///
/// Subscribers get a new [`ThemeSnapshot`] whenever the effective palette or
/// mode changes; an OS scheme change under an explicit mode is not sent.
pub struct ThemeStore {
    kv: Arc<dyn KeyValueStore>,
    tx: watch::Sender<ThemeSnapshot>,
}

impl ThemeStore {
    /// Create a store in `system` mode with no OS scheme reported
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(ThemeSnapshot::new(ThemeMode::default(), None));
        Self { kv, tx }
    }

    /// Restore the persisted mode; faults keep `system`
    pub fn load(&self) {
        match self.kv.get::<ThemeMode>(keys::THEME_MODE) {
            Ok(Some(mode)) => self.apply(mode, self.system_scheme()),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to load theme"),
        }
    }

    /// Chosen mode
    pub fn mode(&self) -> ThemeMode {
        self.tx.borrow().mode
    }

    /// Last scheme reported by the OS
    pub fn system_scheme(&self) -> Option<ColorScheme> {
        self.tx.borrow().system_scheme
    }

    /// Change the mode and persist it
    ///
    /// Returns whether the mode was persisted; it applies either way.
    pub fn set_mode(&self, mode: ThemeMode) -> bool {
        let persisted = match self.kv.set(keys::THEME_MODE, &mode) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save theme");
                false
            }
        };
        self.apply(mode, self.system_scheme());
        persisted
    }

    /// Record the scheme reported by the OS
    pub fn set_system_scheme(&self, scheme: Option<ColorScheme>) {
        self.apply(self.mode(), scheme);
    }

    /// Active palette
    pub fn colors(&self) -> ThemeColors {
        self.tx.borrow().colors
    }

    /// Whether the dark palette is active
    pub fn is_dark(&self) -> bool {
        self.tx.borrow().is_dark
    }

    /// Current effective theme
    pub fn snapshot(&self) -> ThemeSnapshot {
        *self.tx.borrow()
    }

    /// Receive a snapshot on every effective change
    pub fn subscribe(&self) -> watch::Receiver<ThemeSnapshot> {
        self.tx.subscribe()
    }

    fn apply(&self, mode: ThemeMode, system_scheme: Option<ColorScheme>) {
        let next = ThemeSnapshot::new(mode, system_scheme);
        self.tx.send_if_modified(|current| {
            let visible = current.mode != next.mode || current.is_dark != next.is_dark;
            *current = next;
            visible
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::KvStore;

    fn store() -> (ThemeStore, Arc<KvStore>) {
        let kv = Arc::new(KvStore::in_memory().unwrap());
        (ThemeStore::new(kv.clone()), kv)
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FFFFFF"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#8A2BE2"), Some((138, 43, 226)));
        assert_eq!(parse_hex_color("121212"), Some((18, 18, 18)));
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn test_theme_mode_parse_and_display() {
        assert_eq!("DARK".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert_eq!("system".parse::<ThemeMode>().unwrap(), ThemeMode::System);
        assert!("dim".parse::<ThemeMode>().is_err());
        assert_eq!(ThemeMode::Light.to_string(), "Light");
        assert_eq!(serde_json::to_string(&ThemeMode::Dark).unwrap(), "\"dark\"");
    }

    #[test]
    fn test_default_is_system_unknown_scheme_is_light() {
        let (store, _) = store();
        assert_eq!(store.mode(), ThemeMode::System);
        assert!(!store.is_dark());
        assert_eq!(store.colors(), LIGHT_COLORS);
    }

    #[test]
    fn test_system_mode_tracks_os() {
        let (store, _) = store();
        store.set_system_scheme(Some(ColorScheme::Dark));
        assert!(store.is_dark());
        assert_eq!(store.colors(), DARK_COLORS);

        store.set_system_scheme(Some(ColorScheme::Light));
        assert!(!store.is_dark());
        assert_eq!(store.colors().secondary, "#6A1CB2");
    }

    #[test]
    fn test_explicit_modes_ignore_os() {
        let (store, _) = store();
        store.set_mode(ThemeMode::Dark);
        store.set_system_scheme(Some(ColorScheme::Light));
        assert!(store.is_dark());

        store.set_mode(ThemeMode::Light);
        store.set_system_scheme(Some(ColorScheme::Dark));
        assert!(!store.is_dark());
        assert_eq!(store.colors().background, "#FFFFFF");
    }

    #[test]
    fn test_mode_persists() {
        let (store, kv) = store();
        assert!(store.set_mode(ThemeMode::Dark));

        let stored: Option<ThemeMode> = kv.get(keys::THEME_MODE).unwrap();
        assert_eq!(stored, Some(ThemeMode::Dark));

        let reloaded = ThemeStore::new(kv);
        reloaded.load();
        assert_eq!(reloaded.mode(), ThemeMode::Dark);
        assert!(reloaded.is_dark());
    }

    #[test]
    fn test_unknown_stored_mode_keeps_default() {
        let (store, kv) = store();
        kv.set(keys::THEME_MODE, "sepia").unwrap();
        store.load();
        assert_eq!(store.mode(), ThemeMode::System);
    }

    #[tokio::test]
    async fn test_subscribers_skip_invisible_changes() {
        let (store, _) = store();
        store.set_mode(ThemeMode::Light);
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.set_system_scheme(Some(ColorScheme::Dark));
        assert!(!rx.has_changed().unwrap());

        store.set_mode(ThemeMode::System);
        assert!(rx.has_changed().unwrap());
        let snapshot = *rx.borrow_and_update();
        assert!(snapshot.is_dark);
        assert_eq!(snapshot.colors.card, "#1E1E1E");
    }
}
