use crate::{monitor::Monitor, notifier::Notifier};

/// Collects the reports of all monitors and hands the combined text to every
/// notifier. Returns the text that was sent, empty when nothing was.
pub fn run(monitors: &[Box<dyn Monitor>], notifiers: &[Box<dyn Notifier>], force: bool) -> String {
    let mut reports = Vec::new();
    for monitor in monitors {
        match monitor.notify(force) {
            Ok(report) if report.is_empty() => log::debug!("{}: nothing to report", monitor.name()),
            Ok(report) => reports.push(report),
            Err(err) => {
                log::error!("{} monitor failed: {err}", monitor.name());
                reports.push(format!("Error: {} monitor failed: {err}", monitor.name()));
            }
        }
    }

    let msg = reports.join("\n\n");
    if msg.is_empty() {
        return msg;
    }

    for notifier in notifiers {
        if let Err(err) = notifier.send_notification(&msg) {
            log::error!("{} notifier failed: {err}", notifier.name());
        }
    }

    msg
}
