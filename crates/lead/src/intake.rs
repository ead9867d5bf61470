//! Lead submission boundary: request/reply wire types, errors and the HTTP intake.

use std::time::Duration;

use noora_config::LeadConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the upstream gives no reason of its own.
pub const GENERIC_FAILURE: &str = "Failed to submit lead. Please try again.";
pub const DEFAULT_CONFIRMATION: &str = "Lead submitted successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRequest {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl IntakeReply {
    pub fn success() -> Self {
        Self {
            status: ReplyStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: Some(message.into()),
        }
    }
}

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Please enter a valid email")]
    InvalidEmail,
    /// Upstream answered with `status: "error"`; the message is shown as-is.
    #[error("{0}")]
    Rejected(String),
    #[error("{GENERIC_FAILURE}")]
    Transport(#[from] reqwest::Error),
    #[error("{GENERIC_FAILURE}")]
    Status(u16),
    #[error("{GENERIC_FAILURE}")]
    Decode(#[from] serde_json::Error),
    /// No intake was configured for this run.
    #[error("{GENERIC_FAILURE}")]
    Unavailable,
}

/// Trim and check an email before anything leaves the process.
pub fn validate_email(raw: &str) -> Result<String, LeadError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(LeadError::MissingEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email.to_string())
        }
        _ => Err(LeadError::InvalidEmail),
    }
}

/// Collaborator that delivers a lead upstream. Implementations may block; callers run them off
/// the frame loop.
pub trait LeadIntake: Send + Sync + 'static {
    fn submit(&self, request: &LeadRequest) -> Result<IntakeReply, LeadError>;
}

/// Validate, submit and interpret the reply. Returns the confirmation message.
pub fn submit_lead(intake: &dyn LeadIntake, raw_email: &str) -> Result<String, LeadError> {
    let email = validate_email(raw_email)?;
    let reply = intake.submit(&LeadRequest { email })?;
    match reply.status {
        ReplyStatus::Success => Ok(reply
            .message
            .unwrap_or_else(|| DEFAULT_CONFIRMATION.to_string())),
        ReplyStatus::Error => Err(LeadError::Rejected(
            reply
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        )),
    }
}

/// POSTs `{"email": ...}` as JSON and expects `{"status": ..., "message": ...}` back.
pub struct HttpIntake {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpIntake {
    pub fn new(cfg: &LeadConfig) -> Result<Self, LeadError> {
        let timeout = Duration::from_secs_f32(cfg.timeout_secs.max(0.1));
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LeadIntake for HttpIntake {
    fn submit(&self, request: &LeadRequest) -> Result<IntakeReply, LeadError> {
        let response = self.client.post(&self.endpoint).json(request).send()?;
        let status = response.status();
        let body = response.bytes()?;
        // Error replies usually come with a non-2xx code but still carry a JSON body.
        match serde_json::from_slice::<IntakeReply>(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => Err(LeadError::Status(status.as_u16())),
            Err(e) => Err(LeadError::Decode(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::thread;

    struct Canned {
        reply: IntakeReply,
        seen: Mutex<Vec<LeadRequest>>,
    }

    impl LeadIntake for Canned {
        fn submit(&self, request: &LeadRequest) -> Result<IntakeReply, LeadError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            Ok(self.reply.clone())
        }
    }

    fn canned(reply: IntakeReply) -> Canned {
        Canned {
            reply,
            seen: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn missing_email_never_reaches_intake() {
        let intake = canned(IntakeReply::success());
        let err = submit_lead(&intake, "   ").unwrap_err();
        assert!(matches!(err, LeadError::MissingEmail));
        assert_eq!(err.to_string(), "Email is required");
        assert!(intake.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(matches!(validate_email("nobody"), Err(LeadError::InvalidEmail)));
        assert!(matches!(validate_email("a@b@c"), Err(LeadError::InvalidEmail)));
        assert!(matches!(validate_email("@x.io"), Err(LeadError::InvalidEmail)));
        assert_eq!(validate_email(" user@example.com ").unwrap(), "user@example.com");
    }

    #[test]
    fn success_and_error_replies() {
        let ok = canned(IntakeReply::success());
        assert_eq!(submit_lead(&ok, "user@example.com").unwrap(), DEFAULT_CONFIRMATION);
        assert_eq!(ok.seen.lock().unwrap()[0].email, "user@example.com");

        let rejected = canned(IntakeReply::error("X"));
        let err = submit_lead(&rejected, "user@example.com").unwrap_err();
        assert_eq!(err.to_string(), "X");

        let silent = canned(IntakeReply {
            status: ReplyStatus::Error,
            message: None,
        });
        assert_eq!(
            submit_lead(&silent, "user@example.com").unwrap_err().to_string(),
            GENERIC_FAILURE
        );
    }

    #[test]
    fn reply_wire_format() {
        let r: IntakeReply = serde_json::from_str(r#"{"status":"error","message":"X"}"#).unwrap();
        assert_eq!(r, IntakeReply::error("X"));
        let r: IntakeReply = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(r.status, ReplyStatus::Success);
        let body = serde_json::to_string(&LeadRequest {
            email: "a@b.c".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"email":"a@b.c"}"#);
    }

    /// One-shot HTTP server answering with `status` and `body`; returns the request it saw.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/lead", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let len = text[..split]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= split + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (url, handle)
    }

    fn http_intake(endpoint: String) -> HttpIntake {
        HttpIntake::new(&LeadConfig {
            endpoint,
            timeout_secs: 5.0,
        })
        .unwrap()
    }

    #[test]
    fn http_intake_posts_json() {
        let (url, server) = serve_once("200 OK", r#"{"status":"success","message":"ok"}"#);
        let intake = http_intake(url);
        let reply = intake
            .submit(&LeadRequest {
                email: "user@example.com".into(),
            })
            .unwrap();
        assert_eq!(reply.message.as_deref(), Some("ok"));
        let seen = server.join().unwrap();
        assert!(seen.starts_with("POST /lead"));
        assert!(seen.contains(r#"{"email":"user@example.com"}"#));
    }

    #[test]
    fn http_error_body_is_still_read() {
        let (url, server) = serve_once("400 Bad Request", r#"{"status":"error","message":"X"}"#);
        let err = submit_lead(&http_intake(url), "user@example.com").unwrap_err();
        assert_eq!(err.to_string(), "X");
        server.join().unwrap();
    }

    #[test]
    fn http_status_without_body_maps_to_generic_failure() {
        let (url, server) = serve_once("502 Bad Gateway", "oops");
        let err = submit_lead(&http_intake(url), "user@example.com").unwrap_err();
        assert!(matches!(err, LeadError::Status(502)));
        assert_eq!(err.to_string(), GENERIC_FAILURE);
        server.join().unwrap();
    }
}
