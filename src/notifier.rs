use crate::error::Error;

pub mod matrix;
pub mod stdout;

pub trait Notifier {
    fn name(&self) -> &str;

    fn send_notification(&self, msg: &str) -> Result<(), Error>;
}
