use reqwest::Client;

use crate::error::Error;

pub struct Reloader {
    daemon: String,
    url: String,
    client: Client,
}

impl Reloader {
    pub fn new(daemon: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            daemon: daemon.into(),
            url: format!("http://{}/-/reload", host.into()),
            client: Client::new(),
        }
    }

    pub async fn reload(&self) -> Result<(), Error> {
        let resp = self
            .client
            .post(&self.url)
            .header("content-type", "text/plain")
            .body("")
            .send()
            .await
            .map_err(|e| Error::Reload(format!("error reloading {}: {}", self.daemon, e)))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Reload(format!(
                "error reloading {} (status {}): {}",
                self.daemon,
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}
