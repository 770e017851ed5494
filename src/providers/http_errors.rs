use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_matches(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::TimedOut, "timed out")
}

/// Turns a transport failure into a message that names the target and what to
/// check. `target` is a short noun such as "model API" or "website".
pub(crate) fn http_request_error(err: reqwest::Error, url: &str, target: &str) -> anyhow::Error {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return anyhow!("Request to {} at '{}' timed out", target, url);
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return anyhow!(
                "Connection refused by {} at '{}'. Ensure it is running and the URL is correct.",
                target,
                url
            );
        }

        return anyhow!(
            "Failed to connect to {} at '{}'. Check the URL and network connectivity.",
            target,
            url
        );
    }

    anyhow!("Failed to call {} at '{}': {}", target, url, err)
}

#[cfg(test)]
mod tests {
    use super::{error_chain_has_connection_refused, error_chain_has_timeout, http_request_error};
    use reqwest::Client;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_errors_to_actionable_message() {
        let addr = free_local_addr();
        let url = format!("http://{}/", addr);
        let client = Client::new();

        let req_err = client
            .get(&url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        let mapped = http_request_error(req_err, &url, "website");
        let msg = format!("{mapped:#}");

        assert!(
            msg.contains("Connection refused by website"),
            "unexpected message: {msg}"
        );
        assert!(msg.contains(&url), "unexpected message: {msg}");
    }

    #[tokio::test]
    async fn maps_timeout_errors_to_actionable_message() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let url = format!("http://{}/chat/completions", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let msg = format!("{:#}", http_request_error(req_err, &url, "model API"));

        assert!(
            msg.contains("Request to model API") && msg.contains("timed out"),
            "unexpected message: {msg}"
        );

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_error_kinds_in_io_errors() {
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(error_chain_has_timeout(&timed_out));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope");
        assert!(error_chain_has_connection_refused(&refused));
        assert!(!error_chain_has_timeout(&refused));
    }
}
