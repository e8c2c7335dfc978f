//! Display page engine.
//!
//! - [`screen`] - coordinate-checked output on the character display
//! - [`page`] - the page contract and the context pages run in
//! - [`engine`] - page stack with deferred activation
//! - [`main_page`] - the home page

pub mod engine;
pub mod main_page;
pub mod page;
pub mod screen;

pub use engine::{Activator, PageEngine};
pub use main_page::MainPage;
pub use page::{DEFAULT_PERIODIC_MS, Page, PageContext};
pub use screen::Screen;
