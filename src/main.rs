//! NexChat console host
//!
//! Mounts the chat widget on an in-memory page backed by a Frappe site and
//! drives it from stdin: every line is sent as a message, and the
//! conversation is printed as it renders.

use chrono::Local;
use nexchat::runtime::Notification;
use nexchat::{
    Document, FrappeConfig, FrappeTransport, LoggingTransport, Message, MountOutcome, Sender,
    WidgetConfig, WidgetHandle, WidgetInitializer,
};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the conversation
    let fmt_layer = if std::env::var("NEXCHAT_LOG_JSON").is_ok() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexchat=info".into()),
        )
        .with(fmt_layer)
        .init();

    // Configuration
    let frappe = FrappeConfig::from_env()?;
    let widget_config = match std::env::var("NEXCHAT_WIDGET_CONFIG") {
        Ok(path) => {
            tracing::info!(path = %path, "Loading widget config");
            WidgetConfig::from_json(&std::fs::read_to_string(&path)?)?
        }
        Err(_) => WidgetConfig::default(),
    };

    tracing::info!(site = %frappe.site_url, method = %widget_config.method, "Connecting to Frappe site");
    let transport = Arc::new(LoggingTransport::new(FrappeTransport::new(frappe)?));
    let greeting = widget_config.greeting.clone();
    let initializer = WidgetInitializer::new(widget_config, transport);

    let page = Arc::new(Mutex::new(Document::new()));
    let widget = match initializer.mount(page.clone()) {
        MountOutcome::Mounted(widget) => widget,
        MountOutcome::AlreadyMounted => return Err("widget already mounted".into()),
    };

    let mut notifications = widget.handle.subscribe();
    widget.handle.click_trigger().await?;

    if !greeting.is_empty() {
        println!("[{}] bot: {greeting}", Local::now().format("%H:%M"));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        converse(&widget.handle, &mut notifications, line).await?;
    }

    tracing::debug!("Input closed, shutting down");
    widget.handle.shutdown();
    widget.task.await?;

    Ok(())
}

/// Send one line and print the conversation until the reply is in
async fn converse(
    handle: &WidgetHandle,
    notifications: &mut broadcast::Receiver<Notification>,
    line: String,
) -> Result<(), Box<dyn std::error::Error>> {
    handle.send(line).await?;

    // One send renders exactly one bot entry
    loop {
        match notifications.recv().await {
            Ok(Notification::MessageAppended(message)) => {
                print_message(&message);
                if message.sender == Sender::Bot {
                    return Ok(());
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notification receiver lagged");
            }
            Err(RecvError::Closed) => return Err("widget stopped".into()),
        }
    }
}

fn print_message(message: &Message) {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    println!("[{}] {who}: {}", message.timestamp, message.text);
}
