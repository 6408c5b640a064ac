#![forbid(unsafe_code)]

//! `event-booking-ctl`: command-line companion for `event-booking`.
//!
//! Talks to the admin HTTP API with the bearer token and prints the JSON
//! responses. Intended for staff working from a terminal.

use clap::{Parser, Subcommand};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(
    name = "event-booking-ctl",
    about = "Admin CLI for the event-booking server",
    version,
    long_about = None
)]
struct Cli {
    /// Base URL of the running server.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Admin bearer token.
    #[arg(long, env = "BOOKING_ADMIN_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every appointment.
    List,

    /// Confirm a pending appointment.
    Confirm {
        /// Appointment ID.
        id: String,
    },

    /// Cancel an appointment (rejects it while pending).
    Cancel {
        /// Appointment ID.
        id: String,
        /// Optional reason shown to the customer.
        #[arg(long)]
        reason: Option<String>,
    },

    /// Remove an appointment from storage without notifying anyone.
    Delete {
        /// Appointment ID.
        id: String,
    },

    /// Email the reminder to a confirmed appointment's customer.
    Remind {
        /// Appointment ID.
        id: String,
    },

    /// Show which integrations are configured.
    Health,

    /// Check calendar connectivity.
    ProbeCalendar,

    /// Show the most recent audit entries.
    Audit {
        /// Maximum number of entries.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete every audit entry.
    ClearAudit,
}

impl Command {
    /// HTTP method, path, and optional JSON body for this command.
    fn request(&self) -> (Method, String, Option<Value>) {
        let action = |id: &str, body: Value| {
            (
                Method::POST,
                format!("/api/admin/appointments/{id}"),
                Some(body),
            )
        };

        match self {
            Self::List => (Method::GET, "/api/admin/appointments".into(), None),
            Self::Confirm { id } => action(id, json!({ "action": "confirm" })),
            Self::Cancel { id, reason } => {
                let mut body = json!({ "action": "cancel" });
                if let Some(reason) = reason {
                    body["reason"] = Value::String(reason.clone());
                }
                action(id, body)
            }
            Self::Delete { id } => action(id, json!({ "action": "delete" })),
            Self::Remind { id } => action(id, json!({ "action": "remind" })),
            Self::Health => (Method::GET, "/api/admin/health".into(), None),
            Self::ProbeCalendar => (Method::GET, "/api/admin/health/calendar".into(), None),
            Self::Audit { limit } => {
                let path = match limit {
                    Some(limit) => format!("/api/admin/audit?limit={limit}"),
                    None => "/api/admin/audit".into(),
                };
                (Method::GET, path, None)
            }
            Self::ClearAudit => (Method::DELETE, "/api/admin/audit".into(), None),
        }
    }
}

fn main() {
    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(send_admin_request(&args)) {
        Ok((status, body)) if status.is_success() => {
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
        }
        Ok((status, body)) => {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            eprintln!("Error ({status}): {message}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Failed to reach server: {err}");
            eprintln!("Is event-booking running at '{}'?", args.url);
            std::process::exit(1);
        }
    }
}

/// Send one admin request and decode the JSON response.
async fn send_admin_request(
    args: &Cli,
) -> std::result::Result<(StatusCode, Value), Box<dyn std::error::Error>> {
    let (method, path, body) = args.command.request();
    let url = format!("{}{path}", args.url.trim_end_matches('/'));

    let mut request = reqwest::Client::new()
        .request(method, url)
        .bearer_auth(&args.token);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };
    Ok((status, body))
}
