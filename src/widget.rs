//! The chat widget: submit handling and the request/response exchange.
//!
//! # Flow
//!
//! ```text
//! submit ──► prevent default ──► read input ──► render user message
//!        ──► clear input ──► POST /ask (suspend) ──► render bot message
//! ```
//!
//! Everything up to the network call happens synchronously inside the
//! submit listener, so the user's message is on screen before any request
//! completes. The rest of the exchange is a future handed to the host's
//! local executor through a [`Spawner`].
//!
//! Exchanges are independent. Two quick submits produce two in-flight
//! requests, and their bot messages are appended in whichever order the
//! responses arrive.

use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::message::MessageRole;
use crate::transport::{AskError, AskTransport};
use crate::view::{
    InputField, ListenerError, MessageContainer, SubmitEvent, SubmitSource, render_message,
};

/// Class added to the node rendered for a failed exchange under
/// [`FailurePolicy::Notify`].
pub const ERROR_CLASS: &str = "error-message";

/// Text rendered for a failed exchange under [`FailurePolicy::Notify`].
pub const ERROR_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// Runs an exchange future on the host's single-threaded executor.
///
/// In the browser this is `wasm_bindgen_futures::spawn_local`; natively,
/// `tokio::task::spawn_local` inside a `LocalSet`.
pub type Spawner = fn(LocalBoxFuture<'static, ()>);

/// What the widget shows when an exchange fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Render nothing. The user's message stays without a reply.
    #[default]
    Silent,
    /// Render a bot-styled error notice.
    Notify,
}

/// Result of one exchange.
#[derive(Debug)]
pub enum ExchangeOutcome {
    /// The backend answered and the bot message was rendered.
    Answered {
        /// Rendered answer text.
        answer: String,
    },
    /// The exchange failed before an answer could be rendered.
    Failed(AskError),
}

impl ExchangeOutcome {
    /// The rendered answer, if any.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { answer } => Some(answer),
            Self::Failed(_) => None,
        }
    }

    /// Whether the exchange failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

struct WidgetInner<I, C, T> {
    input: I,
    container: C,
    transport: T,
    failure_policy: FailurePolicy,
}

/// A chat widget bound to one input, one container and one transport.
///
/// Cloning yields another handle to the same widget.
pub struct ChatWidget<I, C, T> {
    inner: Rc<WidgetInner<I, C, T>>,
}

impl<I, C, T> Clone for ChatWidget<I, C, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<I, C, T> std::fmt::Debug for ChatWidget<I, C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("failure_policy", &self.inner.failure_policy)
            .finish_non_exhaustive()
    }
}

impl<I, C, T> ChatWidget<I, C, T>
where
    I: InputField + 'static,
    C: MessageContainer + 'static,
    T: AskTransport + 'static,
{
    /// Create a widget without binding it to a form.
    #[must_use]
    pub fn new(input: I, container: C, transport: T) -> Self {
        Self::with_failure_policy(input, container, transport, FailurePolicy::default())
    }

    /// Create a widget with an explicit failure policy.
    #[must_use]
    pub fn with_failure_policy(
        input: I,
        container: C,
        transport: T,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            inner: Rc::new(WidgetInner {
                input,
                container,
                transport,
                failure_policy,
            }),
        }
    }

    /// Create a widget and bind it to `form`.
    ///
    /// Registers exactly one submit listener, which stays registered for the
    /// lifetime of the form. Each submission spawns its exchange through
    /// `spawner`.
    pub fn initialize<F>(
        form: &F,
        input: I,
        container: C,
        transport: T,
        spawner: Spawner,
    ) -> Result<Self, ListenerError>
    where
        F: SubmitSource + ?Sized,
    {
        let widget = Self::new(input, container, transport);
        widget.bind(form, spawner)?;
        Ok(widget)
    }

    /// Register this widget's submit listener on `form`.
    pub fn bind<F>(&self, form: &F, spawner: Spawner) -> Result<(), ListenerError>
    where
        F: SubmitSource + ?Sized,
    {
        let widget = self.clone();
        form.add_submit_listener(Box::new(move |event: &dyn SubmitEvent| {
            let exchange = widget.begin_exchange(event);
            spawner(Box::pin(async move {
                exchange.await;
            }));
        }))
    }

    /// Handle one submit event.
    ///
    /// Prevents the default action, renders the user's message, clears the
    /// input, and returns the rest of the exchange as a future. The returned
    /// future does nothing until polled.
    pub fn begin_exchange(
        &self,
        event: &dyn SubmitEvent,
    ) -> impl Future<Output = ExchangeOutcome> + 'static + use<I, C, T> {
        event.prevent_default();

        let inner = &self.inner;
        let question = inner.input.value();
        render_message(&inner.container, &question, MessageRole::User);
        inner.input.set_value("");

        tracing::debug!(
            name: "widget.exchange.started",
            question_len = question.len(),
            "Question submitted"
        );

        let inner = Rc::clone(&self.inner);
        async move { inner.complete_exchange(&question).await }
    }

    /// Render a message directly.
    pub fn render_message(&self, text: &str, role: MessageRole) {
        render_message(&self.inner.container, text, role);
    }

    /// The input handle.
    pub fn input(&self) -> &I {
        &self.inner.input
    }

    /// The container handle.
    pub fn container(&self) -> &C {
        &self.inner.container
    }
}

impl<I, C, T> WidgetInner<I, C, T>
where
    C: MessageContainer,
    T: AskTransport,
{
    async fn complete_exchange(&self, question: &str) -> ExchangeOutcome {
        match self.transport.ask(question).await {
            Ok(response) => {
                if !response.has_answer() {
                    tracing::warn!(
                        name: "widget.exchange.no_answer",
                        "Response carried no answer; rendering empty message"
                    );
                }
                let answer = response.answer_text();
                render_message(&self.container, &answer, MessageRole::Bot);
                ExchangeOutcome::Answered { answer }
            }
            Err(err) => {
                tracing::warn!(
                    name: "widget.exchange.failed",
                    error = %err,
                    "Ask exchange failed"
                );
                if self.failure_policy == FailurePolicy::Notify {
                    let class_name = format!("{} {ERROR_CLASS}", MessageRole::Bot.class_name());
                    self.container.append_text_node(ERROR_TEXT, &class_name);
                    self.container.scroll_to_bottom();
                }
                ExchangeOutcome::Failed(err)
            }
        }
    }
}
