//! User-visible progress lines ("Creating /etc/openvpn/server.key", "done.").
//!
//! Kept separate from `tracing` output: progress goes to stdout for the
//! operator, logs go to stderr.

use std::io::Write;

pub trait ProgressSink {
    fn message(&mut self, line: &str);
}

/// Prints each line to stdout as it happens
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn message(&mut self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not abort provisioning
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

/// Collects lines in memory
impl ProgressSink for Vec<String> {
    fn message(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<String> = Vec::new();
        sink.message("Creating /etc/openvpn/server.key");
        sink.message("done.");
        assert_eq!(sink, ["Creating /etc/openvpn/server.key", "done."]);
    }
}
