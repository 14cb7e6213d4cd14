use std::io::Write;

use crate::error::Error;

use super::Notifier;

/// Writes notifications to any `Write` sink, standard output by default.
pub struct StdoutNotifier<O = std::io::Stdout> {
    out: std::cell::RefCell<O>,
}

impl Default for StdoutNotifier {
    fn default() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<O: Write> StdoutNotifier<O> {
    pub fn new(out: O) -> Self {
        Self {
            out: std::cell::RefCell::new(out),
        }
    }
}

impl<O: Write> Notifier for StdoutNotifier<O> {
    fn name(&self) -> &str {
        "stdout"
    }

    fn send_notification(&self, msg: &str) -> Result<(), Error> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{msg}")?;
        out.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_notification() {
        let notifier = StdoutNotifier::new(Vec::new());
        notifier.send_notification("first").unwrap();
        notifier.send_notification("second\nline").unwrap();

        assert_eq!(
            String::from_utf8(notifier.out.into_inner()).unwrap(),
            "first\nsecond\nline\n"
        );
    }
}
