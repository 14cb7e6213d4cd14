use crate::error::Error;

pub mod wireguard;

pub trait Monitor {
    fn name(&self) -> &str;

    /// Report text for this check, empty when there is nothing to tell.
    ///
    /// `force` asks for a status report even when no threshold is violated;
    /// monitors without such a report ignore it.
    fn notify(&self, force: bool) -> Result<String, Error>;
}
