use std::io::Write;

/// Where command output goes, so commands can run outside a real process in tests
pub trait Host: Send + Sync {
    // normal output, JSON documents and summaries
    fn output(&mut self) -> impl Write;

    // diagnostics for the user
    fn error(&mut self) -> impl Write;

    /// Ends the process with `code`. Test hosts record the code instead.
    fn exit(&mut self, code: i32);
}

/// Host capturing output in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}
