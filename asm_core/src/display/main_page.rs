//! Home page: title, scrolling banner, radio and GNSS status.

use asm_common::io::{IoId, KeyEvent};
use asm_gnss::Valid;

use super::page::{Page, PageContext};

const TITLE: &str = "AIRSOFT GAME MACHINE";
const BANNER: &str = "*** PRESS A TO CALL THE OTHER UNITS, 1-5 TO TEST THE LAMPS ***";
/// Banner steps once every this many ticks.
const SCROLL_TICKS: u32 = 2;

const ROW_TITLE: u8 = 0;
const ROW_BANNER: u8 = 1;
const ROW_RADIO: u8 = 2;
const ROW_GNSS: u8 = 3;

/// First page shown after startup.
pub struct MainPage {
    banner: String,
    position: usize,
    ticks: u32,
    gnss_line: String,
}

impl MainPage {
    /// Page with the default banner.
    pub fn new() -> Self {
        Self::with_banner(BANNER)
    }

    /// Page scrolling `banner`.
    pub fn with_banner(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
            position: 0,
            ticks: 0,
            gnss_line: String::new(),
        }
    }

    /// Current banner offset.
    pub fn position(&self) -> usize {
        self.position
    }

    fn paint_banner(&self, ctx: &mut PageContext<'_>) {
        let cols = ctx.cols() as usize;
        let window: String = self.banner.chars().skip(self.position).take(cols).collect();
        ctx.clean_row(ROW_BANNER);
        ctx.print(window);
    }

    /// Advance one step; wraps once the tail reaches the right edge.
    fn scroll(&mut self, cols: usize) {
        self.position += 1;
        if self.position >= self.banner.chars().count().saturating_sub(cols) {
            self.position = 0;
        }
    }

    fn status_line(ctx: &mut PageContext<'_>, row: u8, text: &str) {
        ctx.clean_row(row);
        ctx.print(text);
    }

    fn gnss_text(ctx: &PageContext<'_>) -> String {
        match ctx.services().latest_fix() {
            Some(fix) if fix.has(Valid::STATUS) => {
                format!("GPS {} SAT {:02}", fix.status.label(), fix.satellites)
            }
            Some(_) | None => "GPS NO FIX".to_string(),
        }
    }

    fn paint_all(&mut self, ctx: &mut PageContext<'_>) {
        ctx.clean();
        ctx.print_at(0, ROW_TITLE, TITLE);
        self.paint_banner(ctx);
        let radio = if ctx.services().radio.is_some() { "RADIO READY" } else { "RADIO OFF" };
        Self::status_line(ctx, ROW_RADIO, radio);
        self.gnss_line = Self::gnss_text(ctx);
        let line = self.gnss_line.clone();
        Self::status_line(ctx, ROW_GNSS, &line);
    }
}

impl Default for MainPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for MainPage {
    fn load(&mut self, ctx: &mut PageContext<'_>) -> bool {
        self.paint_all(ctx);
        true
    }

    fn refresh(&mut self, ctx: &mut PageContext<'_>) {
        self.paint_all(ctx);
    }

    fn handle_key(&mut self, ctx: &mut PageContext<'_>, key: KeyEvent) {
        match key.ch {
            'A' => {
                let text = if ctx.services().send_radio("HELLO") { "TX HELLO" } else { "TX FAILED" };
                Self::status_line(ctx, ROW_RADIO, text);
            }
            '1'..='5' => {
                let index = key.ch as u8 - b'1';
                let Some(id) = IoId::from_index(index) else {
                    return;
                };
                if let Some(on) = ctx.services().toggle(id) {
                    let text = format!("{} {}", id, if on { "ON" } else { "OFF" });
                    Self::status_line(ctx, ROW_RADIO, &text);
                }
            }
            _ => {}
        }
    }

    fn tick(&mut self, ctx: &mut PageContext<'_>) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % SCROLL_TICKS == 0 {
            let cols = ctx.cols() as usize;
            self.scroll(cols);
            self.paint_banner(ctx);
        }

        let mut last = None;
        while let Some(received) = ctx.services().receive_radio() {
            last = Some(received);
        }
        if let Some(received) = last {
            Self::status_line(ctx, ROW_RADIO, &format!("RX {}", received.text()));
        }

        let gnss = Self::gnss_text(ctx);
        if gnss != self.gnss_line {
            Self::status_line(ctx, ROW_GNSS, &gnss);
            self.gnss_line = gnss;
        }
    }

    fn periodic_time(&self) -> u64 {
        100
    }

    fn name(&self) -> &str {
        "Main Page"
    }
}
