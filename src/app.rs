//! App struct: terminal lifecycle and the event loop.
//!
//! [`App`] ties together the [`Screen`] and an output backend. The
//! `new_headless` constructor renders into an in-memory [`HeadlessBackend`]
//! so applications can be driven without a real terminal.

use std::io;
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::ToolkitConfig;
use crate::event::input::InputEvent;
use crate::render::driver::{Backend, Driver, HeadlessBackend};
use crate::screen::Screen;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Toolkit options handed to the screen.
    pub toolkit: ToolkitConfig,
    /// How long the event loop waits for input before flushing again.
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            toolkit: ToolkitConfig::default(),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the toolkit options (builder).
    pub fn with_toolkit(mut self, toolkit: ToolkitConfig) -> Self {
        self.toolkit = toolkit;
        self
    }

    /// Set the input poll interval (builder).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

enum Output {
    Terminal(Driver),
    Headless(HeadlessBackend),
}

impl Output {
    fn backend(&mut self) -> &mut dyn Backend {
        match self {
            Output::Terminal(driver) => driver,
            Output::Headless(headless) => headless,
        }
    }
}

/// The main application struct.
///
/// Owns the screen and where its frames go.
pub struct App {
    /// The window manager and every widget.
    pub screen: Screen,
    output: Output,
    poll_interval: Duration,
}

impl App {
    /// Create an app drawing to the real terminal.
    ///
    /// Queries the terminal size to set the initial screen dimensions.
    pub fn new(config: AppConfig) -> io::Result<Self> {
        let (width, height) = Driver::terminal_size()?;
        let driver = Driver::new()?;
        Ok(Self {
            screen: Screen::new(width, height, config.toolkit),
            output: Output::Terminal(driver),
            poll_interval: config.poll_interval,
        })
    }

    /// Create a headless app of the given size.
    pub fn new_headless(width: u16, height: u16, config: AppConfig) -> Self {
        Self {
            screen: Screen::new(width, height, config.toolkit),
            output: Output::Headless(HeadlessBackend::new(width, height)),
            poll_interval: config.poll_interval,
        }
    }

    /// The in-memory backend, when headless.
    pub fn headless(&self) -> Option<&HeadlessBackend> {
        match &self.output {
            Output::Headless(headless) => Some(headless),
            Output::Terminal(_) => None,
        }
    }

    /// Whether the app draws to a real terminal.
    pub fn has_driver(&self) -> bool {
        matches!(self.output, Output::Terminal(_))
    }

    /// Feed one input event to the screen. Returns whether it was consumed.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if let (InputEvent::Resize { width, height }, Output::Headless(headless)) = (&event, &mut self.output) {
            headless.resize(*width, *height);
        }
        self.screen.handle_event(event)
    }

    /// Flush pending window updates and send the changed cells out.
    /// Returns the number of cells written.
    pub fn render(&mut self) -> io::Result<usize> {
        let written = self.screen.commit(self.output.backend())?;
        trace!(written, "frame committed");
        Ok(written)
    }

    /// Whether the screen has been asked to quit.
    pub fn should_quit(&self) -> bool {
        !self.screen.is_running()
    }

    /// Request the app to quit.
    pub fn request_quit(&mut self) {
        self.screen.quit();
    }

    /// Run the event loop until the screen quits.
    ///
    /// Enters the alternate screen and raw mode for the duration; both are
    /// restored even when the loop fails. Headless apps just render once.
    pub fn run(&mut self) -> io::Result<()> {
        let mouse = self.screen.config().mouse;
        if let Output::Terminal(driver) = &mut self.output {
            driver.enter_alt_screen()?;
            if mouse {
                driver.enable_mouse()?;
            }
        } else {
            return self.render().map(|_| ());
        }
        debug!("event loop started");
        let result = self.event_loop();
        if let Output::Terminal(driver) = &mut self.output {
            if mouse {
                driver.disable_mouse()?;
            }
            driver.leave_alt_screen()?;
        }
        debug!("event loop finished");
        result
    }

    fn event_loop(&mut self) -> io::Result<()> {
        while self.screen.is_running() {
            self.render()?;
            if crossterm::event::poll(self.poll_interval)? {
                let event = InputEvent::from(crossterm::event::read()?);
                self.handle_input(event);
            }
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
