use chrono::{DateTime, Utc};
use libreg_core::AccountProviderDescription;
use libreg_resolve::RegistryEvent;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_result<T: Serialize>(format: OutputFormat, quiet: bool, result: &T) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => {
            if let Ok(json) = serde_json::to_string_pretty(result) {
                println!("{json}");
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(result) {
                println!("{json}");
            }
        }
    }
}

pub fn print_error(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => eprintln!("error: {message}"),
        OutputFormat::Json => {
            let err = serde_json::json!({"error": message});
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
        }
    }
}

pub fn print_warning(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => eprintln!("warning: {message}"),
        OutputFormat::Json => {
            let warn = serde_json::json!({"warning": message});
            eprintln!("{}", serde_json::to_string(&warn).unwrap_or_default());
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated: DateTime<Utc>,
    pub production: bool,
    pub automatic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

impl From<&AccountProviderDescription> for ProviderInfo {
    fn from(d: &AccountProviderDescription) -> Self {
        Self {
            id: d.id.to_string(),
            title: d.title.clone(),
            description: d.description.clone(),
            updated: d.updated,
            production: d.is_production,
            automatic: d.is_automatic,
            authentication_document: d
                .authentication_document_link()
                .map(|l| l.href_str().to_string()),
            catalog: d.catalog_uri().map(ToString::to_string),
        }
    }
}

pub fn print_provider_list(title: &str, providers: &[ProviderInfo]) {
    println!("{title} ({}):", providers.len());
    for p in providers {
        let testing = if p.production { "" } else { " [testing]" };
        println!("  - {} <{}>{testing}", p.title, p.id);
        if let Some(d) = &p.description {
            println!("    {d}");
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EventRecord {
    Updated { id: String },
    SourceFailed { source: String, error: String },
    StatusChanged { status: &'static str },
}

impl From<&RegistryEvent> for EventRecord {
    fn from(event: &RegistryEvent) -> Self {
        match event {
            RegistryEvent::Updated { id } => EventRecord::Updated { id: id.to_string() },
            RegistryEvent::SourceFailed { source, error } => EventRecord::SourceFailed {
                source: source.clone(),
                error: error.to_string(),
            },
            RegistryEvent::StatusChanged { status } => EventRecord::StatusChanged {
                status: status.as_str(),
            },
        }
    }
}

/// Takes every event already queued on the receiver.
pub fn drain_events(rx: &mut broadcast::Receiver<RegistryEvent>) -> Vec<RegistryEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event receiver lagged");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
        }
    }
}

pub fn print_events(format: OutputFormat, events: &[RegistryEvent]) {
    for event in events {
        let record = EventRecord::from(event);
        match format {
            OutputFormat::Text => match &record {
                EventRecord::Updated { id } => eprintln!("event: updated {id}"),
                EventRecord::SourceFailed { source, error } => {
                    eprintln!("event: source failed {source}: {error}")
                }
                EventRecord::StatusChanged { status } => eprintln!("event: status {status}"),
            },
            OutputFormat::Json => {
                eprintln!("{}", serde_json::to_string(&record).unwrap_or_default());
            }
        }
    }
}

/// Reports failed sources as warnings; returns how many failed.
pub fn report_source_failures(
    format: OutputFormat,
    quiet: bool,
    events: &[RegistryEvent],
) -> usize {
    let mut failed = 0;
    for event in events {
        if let RegistryEvent::SourceFailed { source, error } = event {
            failed += 1;
            print_warning(format, quiet, &format!("source {source} failed: {error}"));
        }
    }
    failed
}
