//! Page contract.

use std::ops::{Deref, DerefMut};

use asm_common::io::KeyEvent;

use super::engine::Activator;
use super::screen::Screen;
use crate::services::Services;

/// Tick cadence used when no page is current.
pub const DEFAULT_PERIODIC_MS: u64 = 100;

/// A screen's worth of behaviour. Pages only reach hardware through the
/// context they are handed.
pub trait Page: Send {
    /// First activation. Returning `false` rejects the page.
    fn load(&mut self, ctx: &mut PageContext<'_>) -> bool;

    /// The page became current again after the one above it left.
    fn refresh(&mut self, _ctx: &mut PageContext<'_>) {}

    /// One keystroke.
    fn handle_key(&mut self, _ctx: &mut PageContext<'_>, _key: KeyEvent) {}

    /// Periodic work, about every [`Page::periodic_time`] ms.
    fn tick(&mut self, _ctx: &mut PageContext<'_>) {}

    /// Tick cadence in milliseconds.
    fn periodic_time(&self) -> u64 {
        DEFAULT_PERIODIC_MS
    }

    /// Diagnostic name.
    fn name(&self) -> &str;
}

/// What a page sees while it runs: the screen, worker handles and the
/// activation slot.
pub struct PageContext<'a> {
    screen: &'a mut Screen,
    services: &'a Services,
    activator: &'a Activator,
}

impl<'a> PageContext<'a> {
    pub(crate) fn new(screen: &'a mut Screen, services: &'a Services, activator: &'a Activator) -> Self {
        Self {
            screen,
            services,
            activator,
        }
    }

    /// Request `page` to become current at the next supervisor step.
    pub fn activate_page(&self, page: Box<dyn Page>) -> bool {
        self.activator.activate(page)
    }

    /// Request the previous page back at the next supervisor step.
    pub fn restore_previous(&self) -> bool {
        self.activator.restore()
    }

    /// Worker handles.
    pub fn services(&self) -> &Services {
        self.services
    }
}

impl Deref for PageContext<'_> {
    type Target = Screen;

    fn deref(&self) -> &Screen {
        self.screen
    }
}

impl DerefMut for PageContext<'_> {
    fn deref_mut(&mut self) -> &mut Screen {
        self.screen
    }
}
