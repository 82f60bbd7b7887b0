//! Widget runtime executor

use super::Notification;
use crate::state_machine::{transition, Effect, Event, RequestId, WidgetContext, WidgetState};
use crate::surface::Surface;
use crate::transport::{OutgoingRequest, RemoteCall};
use crate::view::ConversationView;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Tracing target for backend failure details hidden from the user
pub const DIAGNOSTIC_TARGET: &str = "nexchat::diagnostic";

/// Event loop of one mounted widget
pub struct WidgetRuntime<S, T>
where
    S: Surface + 'static,
    T: RemoteCall + 'static,
{
    context: WidgetContext,
    state: WidgetState,
    view: ConversationView<S>,
    transport: Arc<T>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the loop ends once every handle and in-flight call is gone
    event_tx: mpsc::WeakSender<Event>,
    notify_tx: broadcast::Sender<Notification>,
    cancel: CancellationToken,
}

impl<S, T> WidgetRuntime<S, T>
where
    S: Surface + 'static,
    T: RemoteCall + 'static,
{
    pub fn new(
        context: WidgetContext,
        view: ConversationView<S>,
        transport: Arc<T>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: &mpsc::Sender<Event>,
        notify_tx: broadcast::Sender<Notification>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            context,
            state: WidgetState::default(),
            view,
            transport,
            event_rx,
            event_tx: event_tx.downgrade(),
            notify_tx,
            cancel,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub async fn run(mut self) {
        tracing::info!(method = %self.context.method, "Starting widget runtime");

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    tracing::info!("Widget runtime shut down");
                    break;
                }

                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event),
                    None => break,
                },
            }
        }

        tracing::info!(
            in_flight = self.state.in_flight.len(),
            "Widget runtime stopped"
        );
    }

    fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                // Refused events leave the page untouched
                tracing::debug!(error = %e, "Event refused");
                return;
            }
        };

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SetWindowOpen { open } => {
                self.view.set_window_open(open);
                self.notify(Notification::WindowChanged { open });
            }

            Effect::FocusInput => self.view.focus_input(),

            Effect::AppendMessage {
                text,
                sender,
                is_error,
            } => {
                let message = self.view.append_message(&text, sender, is_error);
                self.notify(Notification::MessageAppended(message));
            }

            Effect::ClearInput => self.view.clear_input(),

            Effect::ShowPending | Effect::HidePending => {
                let visible = matches!(effect, Effect::ShowPending);
                self.view.set_pending(visible);
                self.notify(Notification::PendingChanged { visible });
            }

            Effect::ShowErrorBanner { message } => {
                self.view.show_error_banner(&message);
                self.notify(Notification::ErrorBanner {
                    message: Some(message),
                });
            }

            Effect::HideErrorBanner => {
                self.view.hide_error_banner();
                self.notify(Notification::ErrorBanner { message: None });
            }

            Effect::CallRemote {
                request_id,
                request,
            } => self.spawn_remote_call(request_id, request),

            Effect::LogDiagnostic { summary, detail } => {
                tracing::error!(target: DIAGNOSTIC_TARGET, detail = %detail, "{summary}");
            }
        }
    }

    /// Run the call in the background; its completion comes back as an event
    fn spawn_remote_call(&self, request_id: RequestId, request: OutgoingRequest) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            tracing::warn!(request_id, "Event channel closed, dropping remote call");
            return;
        };

        let transport = self.transport.clone();
        let method = self.context.method.clone();
        let timeout = self.context.request_timeout;
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            tracing::debug!(request_id, method = %method, "Calling remote method");

            let call = async {
                let result = transport.call(&method, &request);
                match timeout {
                    Some(after) => tokio::time::timeout(after, result)
                        .await
                        .map_err(|_| after),
                    None => Ok(result.await),
                }
            };

            let event = tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::debug!(request_id, "Remote call abandoned");
                    return;
                }

                outcome = call => match outcome {
                    Ok(Ok(response)) => Event::RemoteCompleted { request_id, response },
                    Ok(Err(e)) => Event::RemoteFailed {
                        request_id,
                        detail: e.to_string(),
                    },
                    Err(after) => {
                        tracing::warn!(request_id, timeout_secs = after.as_secs(), "Remote call timed out");
                        Event::RemoteTimedOut { request_id, after }
                    }
                },
            };

            // Closed channel means the widget is gone; nothing left to render
            let _ = event_tx.send(event).await;
        });
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.notify_tx.send(notification);
    }
}
