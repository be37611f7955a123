//! Role-scoped sidebar navigation.

pub mod composer;
pub mod menu;

pub use composer::{compose, Accordion, NavigationView, VisibleEntry, VisibleSection};
pub use menu::{validate_menu, MenuEntry, MenuError, MenuSection, MAIN_MENU};
