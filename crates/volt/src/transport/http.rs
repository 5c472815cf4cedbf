//! HTTP transport
//!
//! Sends calls to `/api/1.0/` with the `Procedure`, `Parameters`,
//! credential and `admin` fields. Uses synchronous HTTP (ureq) to be
//! executor-agnostic.

use log::debug;
use std::time::Duration;

use super::wire::WireResponse;
use super::{Transport, TransportError};
use crate::catalog::PreparedCall;
use crate::models::{Endpoint, HttpMethod, Response};

/// Extra time a request may run past the guard's deadline
///
/// The guard answers the caller first; the socket closes shortly after.
const REQUEST_GRACE: Duration = Duration::from_millis(500);

/// ureq-backed transport
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// Request fields for a call against an endpoint
    pub fn request_fields(endpoint: &Endpoint, call: &PreparedCall) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("Procedure", call.procedure.clone()),
            ("Parameters", call.parameters.clone()),
        ];

        if let Some(credentials) = endpoint.credentials() {
            fields.push(("User", credentials.username.clone()));
            let (name, value) = credentials.secret_field();
            fields.push((name, value.to_string()));
        }

        if endpoint.admin() {
            fields.push(("admin", "true".to_string()));
        }

        fields
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        endpoint: &Endpoint,
        call: &PreparedCall,
        timeout: Duration,
    ) -> Result<Response, TransportError> {
        let url = endpoint
            .api_url()
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let fields = Self::request_fields(endpoint, call);
        let limit = Some(timeout + REQUEST_GRACE);

        debug!("{:?} {} procedure={}", endpoint.method(), url, call.procedure);

        let result = match endpoint.method() {
            HttpMethod::Get => {
                let mut request = self.agent.get(url.as_str());
                for (name, value) in &fields {
                    request = request.query(*name, value.as_str());
                }
                request.config().timeout_global(limit).build().call()
            }
            HttpMethod::Post => self
                .agent
                .post(url.as_str())
                .config()
                .timeout_global(limit)
                .build()
                .send_form(fields.iter().map(|(name, value)| (*name, value.as_str()))),
        };

        let mut response = result?;
        let wire: WireResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(wire.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credentials;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    fn statistics_call() -> PreparedCall {
        PreparedCall {
            procedure: "@Statistics".to_string(),
            parameters: r#"["TABLE",0]"#.to_string(),
            long_running: false,
        }
    }

    #[test]
    fn test_request_fields_anonymous() {
        let fields = HttpTransport::request_fields(&Endpoint::new("db1", 8080), &statistics_call());
        assert_eq!(
            fields,
            vec![
                ("Procedure", "@Statistics".to_string()),
                ("Parameters", r#"["TABLE",0]"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_request_fields_with_credentials_and_admin() {
        let endpoint = Endpoint::new("db1", 21211)
            .with_admin(true)
            .with_credentials(Credentials::prehashed("ops", "abc123"));
        let fields = HttpTransport::request_fields(&endpoint, &statistics_call());

        assert!(fields.contains(&("User", "ops".to_string())));
        assert!(fields.contains(&("Hashedpassword", "abc123".to_string())));
        assert!(fields.contains(&("admin", "true".to_string())));
        assert!(!fields.iter().any(|(name, _)| *name == "Password"));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        // Port 9 on localhost is not expected to accept HTTP connections
        let transport = HttpTransport::new();
        let endpoint = Endpoint::new("127.0.0.1", 9);
        let result = transport.send(&endpoint, &statistics_call(), Duration::from_secs(2));
        assert!(result.is_err());
    }

    #[test]
    fn test_silent_server_released_after_call_timeout() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let _held: Vec<_> = listener.incoming().take(1).collect();
            thread::sleep(Duration::from_secs(30));
        });

        let transport = HttpTransport::new();
        let endpoint = Endpoint::new("127.0.0.1", port);
        let started = Instant::now();
        let result = transport.send(&endpoint, &statistics_call(), Duration::from_millis(200));

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
