//! Console target
//!
//! Writes layout-rendered lines to stdout, optionally colored by
//! level. Rendering reuses a shared line buffer; the buffer lock also
//! serializes output so concurrent writers cannot interleave lines.

use crate::core::error::Result;
use crate::core::log_event::LogEvent;
use crate::core::target::Target;
use crate::layout::Layout;
use colored::Colorize;
use parking_lot::Mutex;
use std::io::Write as _;
use std::sync::Arc;

pub struct ConsoleTarget {
    layout: Layout,
    use_colors: bool,
    line_buf: Mutex<String>,
}

impl ConsoleTarget {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            use_colors: true,
            line_buf: Mutex::new(String::with_capacity(256)),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

impl Target for ConsoleTarget {
    fn write(&self, event: &Arc<LogEvent>) -> Result<()> {
        let mut line = self.line_buf.lock();
        line.clear();
        self.layout.render_to(&mut line, event);

        if self.use_colors {
            println!("{}", line.as_str().color(event.level.color_code()));
        } else {
            println!("{}", line);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn precalculate(&self, event: &LogEvent) {
        self.layout.precalculate(event);
    }

    fn name(&self) -> &str {
        "console"
    }
}
