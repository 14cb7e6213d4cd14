use std::time::Duration;

use reqwest::{Url, blocking::Client};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Error;

use super::Notifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub user_id: String,
    pub access_token: String,
    pub room_id: String,
}

/// Posts notifications as plain text messages into a Matrix room.
pub struct MatrixNotifier {
    config: MatrixConfig,
    client: Client,
}

impl MatrixNotifier {
    pub fn new(config: MatrixConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { config, client })
    }

    fn message_url(&self, txn_id: &str) -> Result<Url, Error> {
        let invalid = || Error::Settings(format!("invalid matrix homeserver {}", self.config.homeserver));

        let mut url = Url::parse(&self.config.homeserver).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend([
                "_matrix",
                "client",
                "v3",
                "rooms",
                self.config.room_id.as_str(),
                "send",
                "m.room.message",
                txn_id,
            ]);

        Ok(url)
    }
}

impl Notifier for MatrixNotifier {
    fn name(&self) -> &str {
        "matrix"
    }

    fn send_notification(&self, msg: &str) -> Result<(), Error> {
        let url = self.message_url(&Uuid::new_v4().to_string())?;
        log::debug!(
            "sending matrix message as {} to {}",
            self.config.user_id,
            self.config.room_id
        );

        let res = self
            .client
            .put(url)
            .bearer_auth(&self.config.access_token)
            .json(&serde_json::json!({
                "msgtype": "m.text",
                "body": msg,
            }))
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(Error::Notify(format!("matrix returned {status}: {body}")));
        }

        Ok(())
    }
}
