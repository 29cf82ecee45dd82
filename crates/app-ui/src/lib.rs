//! User interface state for Social Confidence
//!
//! This crate holds the state a screen layer renders from: the theme
//! preference with its palettes, and the navigation shell.
//!
//! # Modules
//!
//! - [`theme`] - Theme mode, OS scheme tracking and color palettes
//! - [`navigation`] - Routes, tab stacks and the auth/main switch
//!
//! # Example
//!
//! ```rust
//! use app_ui::navigation::{AppNavigator, Route, Shell};
//!
//! let mut nav = AppNavigator::new(false);
//! assert_eq!(nav.current_route(), &Route::Onboarding);
//!
//! nav.sync_auth(true);
//! assert_eq!(nav.shell(), Shell::Main);
//! assert_eq!(nav.current_route(), &Route::HomeMain);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod navigation;
pub mod theme;

pub use navigation::{
    AppNavigator, NavigationError, NavigationStack, NavigationTab, Route, Shell, StackEntry,
};
pub use theme::{
    parse_hex_color, resolve_dark, ColorScheme, ThemeColors, ThemeMode, ThemeSnapshot, ThemeStore,
    DARK_COLORS, LIGHT_COLORS,
};
