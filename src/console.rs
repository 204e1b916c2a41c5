/// Diagnostic sink of the builder. Messages form an indented tree whose depth
/// follows the builder's processing phases.
pub trait Console {
    fn debug(&mut self, msg: &str);
    fn info(&mut self, msg: &str);
    fn indent(&mut self);
    fn outdent(&mut self);
}

/// Console for terminal use: `debug` goes through the `log` facade so it can
/// be filtered, `info` is printed for the user directly.
pub struct TermConsole {
    depth: usize,
}

impl TermConsole {
    pub fn new() -> TermConsole {
        TermConsole { depth: 0 }
    }

    fn pad(&self) -> String {
        " ".repeat(2 * self.depth)
    }
}

impl Default for TermConsole {
    fn default() -> Self {
        TermConsole::new()
    }
}

impl Console for TermConsole {
    fn debug(&mut self, msg: &str) {
        log::debug!("{}{}", self.pad(), msg);
    }

    fn info(&mut self, msg: &str) {
        partpack_info!("{}{}", self.pad(), msg);
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn outdent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
