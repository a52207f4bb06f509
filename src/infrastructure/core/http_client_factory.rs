use reqwest::Client;
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates the gateway client.
    ///
    /// No retry middleware: pushes are retried, if at all, by the coordinator.
    /// `request_timeout` bounds the whole exchange; connecting gets at most
    /// half of it.
    pub fn create_client(request_timeout: Duration) -> reqwest::Result<Client> {
        let connect_timeout = (request_timeout / 2).max(Duration::from_millis(100));

        Client::builder()
            .pool_max_idle_per_host(1)
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("unitwatch/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
