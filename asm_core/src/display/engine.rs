//! Page stack with deferred activation.
//!
//! Pages never switch directly. [`Activator::activate`] parks the new page
//! in a single pending slot; the supervisor's next [`PageEngine::step`]
//! pushes it instead of ticking. A second request while one is pending is
//! refused.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use asm_common::hal::HalResult;
use asm_common::io::KeyEvent;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::page::{DEFAULT_PERIODIC_MS, Page, PageContext};
use super::screen::Screen;
use crate::services::Services;

enum Activation {
    Push(Box<dyn Page>),
    Restore,
}

#[derive(Default)]
struct Slot {
    pending: AtomicBool,
    activation: Mutex<Option<Activation>>,
}

/// Pending-activation slot, cloneable into pages and other threads.
#[derive(Clone, Default)]
pub struct Activator {
    slot: Arc<Slot>,
}

impl Activator {
    fn offer(&self, activation: Activation, what: &str) -> bool {
        let mut guard = self.slot.activation.lock();
        if guard.is_some() {
            warn!("display: activation of {} refused, one already pending", what);
            return false;
        }
        *guard = Some(activation);
        self.slot.pending.store(true, Ordering::SeqCst);
        true
    }

    /// Park `page` for activation.
    pub fn activate(&self, page: Box<dyn Page>) -> bool {
        let name = format!("'{}'", page.name());
        self.offer(Activation::Push(page), &name)
    }

    /// Park a return to the previous page.
    pub fn restore(&self) -> bool {
        self.offer(Activation::Restore, "previous page")
    }

    /// Whether an activation is waiting.
    pub fn is_pending(&self) -> bool {
        self.slot.pending.load(Ordering::SeqCst)
    }

    fn take(&self) -> Option<Activation> {
        if !self.is_pending() {
            return None;
        }
        let activation = self.slot.activation.lock().take();
        self.slot.pending.store(false, Ordering::SeqCst);
        activation
    }
}

/// Owns the screen and the page stack. Driven by the supervisor thread.
pub struct PageEngine {
    screen: Screen,
    stack: Vec<Box<dyn Page>>,
    activator: Activator,
    services: Services,
}

impl PageEngine {
    /// Engine over `screen`; pages reach the workers through `services`.
    pub fn new(screen: Screen, services: Services) -> Self {
        Self {
            screen,
            stack: Vec::new(),
            activator: Activator::default(),
            services,
        }
    }

    /// Initialise the display.
    pub fn begin(&mut self) -> HalResult<()> {
        self.screen.begin()
    }

    /// Activation slot.
    pub fn activator(&self) -> Activator {
        self.activator.clone()
    }

    /// Park `page` for the next step.
    pub fn activate_page(&self, page: Box<dyn Page>) -> bool {
        self.activator.activate(page)
    }

    /// Load `page` and make it current. A page whose load fails is
    /// dropped and `false` returned.
    pub fn push(&mut self, mut page: Box<dyn Page>) -> bool {
        let mut ctx = PageContext::new(&mut self.screen, &self.services, &self.activator);
        if !page.load(&mut ctx) {
            warn!("display: page '{}' failed to load", page.name());
            return false;
        }
        info!("display: page '{}' active (depth {})", page.name(), self.stack.len() + 1);
        self.stack.push(page);
        true
    }

    /// Remove the current page; the one below, if any, is refreshed.
    pub fn pop(&mut self) -> Option<Box<dyn Page>> {
        let page = self.stack.pop()?;
        debug!("display: page '{}' closed", page.name());
        if let Some(top) = self.stack.last_mut() {
            let mut ctx = PageContext::new(&mut self.screen, &self.services, &self.activator);
            top.refresh(&mut ctx);
        }
        Some(page)
    }

    /// Apply a pending activation. Returns whether one was consumed.
    pub fn consume_pending(&mut self) -> bool {
        match self.activator.take() {
            Some(Activation::Push(page)) => {
                self.push(page);
                true
            }
            Some(Activation::Restore) => {
                if self.stack.len() > 1 {
                    self.pop();
                } else {
                    warn!("display: no previous page to restore");
                }
                true
            }
            None => false,
        }
    }

    /// Tick the current page.
    pub fn tick(&mut self) {
        if let Some(page) = self.stack.last_mut() {
            let mut ctx = PageContext::new(&mut self.screen, &self.services, &self.activator);
            page.tick(&mut ctx);
        }
    }

    /// One supervisor step: a pending activation replaces the tick.
    pub fn step(&mut self) {
        if !self.consume_pending() {
            self.tick();
        }
    }

    /// Hand a keystroke to the current page.
    pub fn dispatch_key(&mut self, key: KeyEvent) {
        if let Some(page) = self.stack.last_mut() {
            let mut ctx = PageContext::new(&mut self.screen, &self.services, &self.activator);
            page.handle_key(&mut ctx, key);
        }
    }

    /// Tick cadence of the current page.
    pub fn periodic_time(&self) -> u64 {
        self.stack
            .last()
            .map_or(DEFAULT_PERIODIC_MS, |p| p.periodic_time())
    }

    /// Name of the current page.
    pub fn current_name(&self) -> Option<&str> {
        self.stack.last().map(|p| p.name())
    }

    /// Pages on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pop and drop every page, top first.
    pub fn clear(&mut self) {
        while let Some(page) = self.stack.pop() {
            debug!("display: page '{}' destroyed", page.name());
        }
        // anything still parked is never shown
        drop(self.activator.take());
    }

    /// Worker handles given to pages.
    pub fn services(&self) -> &Services {
        &self.services
    }
}
