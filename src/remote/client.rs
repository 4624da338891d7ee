//! HTTP client for the path optimizer service.

use super::command::{InitEnvironmentRequest, RunOptimizationRequest, RunOptimizationResponse, RunStatus};
use super::{RemoteError, RemotePlanner};
use crate::common::BackendConfig;
use reqwest::blocking::{Client, Response};
use std::time::Duration;

/// Blocking client for the optimizer's `/api` endpoints.
pub struct PlannerClient {
    client: Client,
    base_url: String,
}

impl PlannerClient {
    /// Create a new PlannerClient with the given backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// POST a JSON body and turn non-2xx answers into `RemoteError::Rejected`.
    fn post<T: serde::Serialize + std::fmt::Debug>(&self, path: &str, payload: Option<&T>) -> Result<Response, RemoteError> {
        let url = self.endpoint(path);
        log::debug!("POST {}: {:?}", url, payload);

        let mut request = self.client.post(&url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        let response = request.send().map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(RemoteError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl RemotePlanner for PlannerClient {
    fn init_environment(&self, request: &InitEnvironmentRequest) -> Result<(), RemoteError> {
        self.post("init-environment", Some(request))?;
        log::info!("Environment initialized with {} obstacles", request.obstacles.len());
        Ok(())
    }

    fn run_optimization(&self, request: &RunOptimizationRequest) -> Result<RunStatus, RemoteError> {
        let response = self.post("run-pso", Some(request))?;
        let body: RunOptimizationResponse = response.json().map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        if let Some(message) = &body.message {
            log::info!("Optimizer says: {}", message);
        }
        Ok(RunStatus::from_token(&body.status))
    }

    fn stop_optimization(&self) -> Result<(), RemoteError> {
        let response = self.post::<()>("stop-optimization", None)?;
        let body = response.text().unwrap_or_default();
        log::info!("Stop request acknowledged: {}", body.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Point;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::JoinHandle;

    fn client_for(url: String) -> PlannerClient {
        let config = BackendConfig {
            url,
            request_timeout_secs: 5,
            ..Default::default()
        };
        PlannerClient::new(&config).unwrap()
    }

    /// Read one request, headers and body.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Answer a single request with a canned response and hand back what was received.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (url, handle)
    }

    fn environment() -> InitEnvironmentRequest {
        InitEnvironmentRequest::new(600.0, 10.0, Point::new(50.0, 300.0), Point::new(550.0, 300.0), [])
    }

    fn run_request() -> RunOptimizationRequest {
        RunOptimizationRequest {
            max_iter: 100,
            pop_size: 100,
            num_control_points: 2,
            resolution: 50,
        }
    }

    #[test]
    fn endpoints_ignore_trailing_slash() {
        let client = client_for("http://planner.local:5000/".to_string());
        assert_eq!(client.endpoint("run-pso"), "http://planner.local:5000/api/run-pso");
    }

    #[test]
    fn server_error_is_rejected_with_status_and_body() {
        let (url, server) = serve_once("500 Internal Server Error", "environment invalid");
        let result = client_for(url).init_environment(&environment());
        assert_eq!(
            result,
            Err(RemoteError::Rejected {
                status: 500,
                body: "environment invalid".to_string(),
            })
        );
        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/init-environment "));
        assert!(request.contains("\"robotRadius\":10.0"));
    }

    #[test]
    fn run_answer_is_decoded_into_a_status() {
        let (url, server) = serve_once("200 OK", r#"{"status":"optimization_started","message":"ok"}"#);
        assert_eq!(client_for(url).run_optimization(&run_request()), Ok(RunStatus::Started));
        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/run-pso "));
        assert!(request.contains("\"maxIter\":100"));
        assert!(request.contains("\"numControlPoints\":2"));
    }

    #[test]
    fn undecodable_run_answer_is_an_invalid_response() {
        let (url, server) = serve_once("200 OK", "<html>definitely not json</html>");
        let result = client_for(url).run_optimization(&run_request());
        assert!(matches!(result, Err(RemoteError::InvalidResponse(_))), "got {:?}", result);
        server.join().unwrap();
    }

    #[test]
    fn closed_port_is_a_network_error() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let result = client_for(format!("http://127.0.0.1:{}", port)).stop_optimization();
        assert!(matches!(result, Err(RemoteError::Network(_))), "got {:?}", result);
    }
}
