//! # Test doubles for clients
//!
//! Lets a typed client run against scripted replies instead of a live actor.
//!
//! Use [`MockClient`] to queue expected actions and their canned responses, or
//! [`create_mock_client`] plus [`expect_action`] to drive the conversation by hand.

use crate::framework::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// -----------------------------------------------------------------------------
// Scripted replies
// -----------------------------------------------------------------------------

type Matcher<T> = Box<dyn Fn(&<T as ActorEntity>::Action) -> bool + Send>;

/// One expected action and the response the mock replies with.
struct Expectation<T: ActorEntity> {
    label: &'static str,
    matcher: Matcher<T>,
    response: Result<T::ActionResult, FrameworkError<T::Error>>,
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// Answers requests from a queue of scripted replies, in order, and records
/// anything it was not told to expect.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<Market>::new();
/// mock.expect_action("confirm", |a| matches!(a, MarketAction::Confirm { .. }))
///     .return_ok(MarketActionResult::Order(order));
///
/// let client = OrderClient::new(mock.client());
/// client.confirm(order_id, ConfirmSide::Buyer, buyer_id).await?;
/// mock.verify();
/// ```
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _responder: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> MockClient<T> {
    /// Starts the answering task with an empty script.
    pub fn new() -> Self {
        let (sender, mut requests) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));
        let script = expectations.clone();
        let seen_mismatches = mismatches.clone();

        let responder = tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                match request {
                    ResourceRequest::Action { action, respond_to } => {
                        let next = script.lock().unwrap().pop_front();
                        match next {
                            Some(exp) if (exp.matcher)(&action) => {
                                let _ = respond_to.send(exp.response);
                            }
                            Some(exp) => {
                                seen_mismatches
                                    .lock()
                                    .unwrap()
                                    .push(format!("expected {}, got {:?}", exp.label, action));
                                let _ = respond_to.send(Err(FrameworkError::ActorDropped));
                            }
                            None => {
                                seen_mismatches
                                    .lock()
                                    .unwrap()
                                    .push(format!("unexpected {:?}", action));
                                let _ = respond_to.send(Err(FrameworkError::ActorDropped));
                            }
                        }
                    }
                    ResourceRequest::Shutdown { respond_to } => {
                        let _ = respond_to.send(());
                        break;
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            mismatches,
            _responder: responder,
        }
    }

    /// A client wired to this mock; hand it to the wrapper under test.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects an action accepted by `matcher`; `label` names it in failure output.
    pub fn expect_action(
        &mut self,
        label: &'static str,
        matcher: impl Fn(&T::Action) -> bool + Send + 'static,
    ) -> ActionExpectationBuilder<T> {
        ActionExpectationBuilder {
            label,
            matcher: Box::new(matcher),
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met in order.
    pub fn verify(&self) {
        let mismatches = self.mismatches.lock().unwrap();
        if !mismatches.is_empty() {
            panic!("Unexpected requests: {:?}", *mismatches);
        }
        let remaining = self.expectations.lock().unwrap();
        if !remaining.is_empty() {
            panic!("{} scripted replies never used", remaining.len());
        }
    }
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returned by [`MockClient::expect_action`]; finish it with a reply.
pub struct ActionExpectationBuilder<T: ActorEntity> {
    label: &'static str,
    matcher: Matcher<T>,
    expectations: Expectations<T>,
}

impl<T: ActorEntity> ActionExpectationBuilder<T> {
    /// Replies with `result`.
    pub fn return_ok(self, result: T::ActionResult) {
        self.push(Ok(result));
    }

    /// Replies with `error`.
    pub fn return_err(self, error: FrameworkError<T::Error>) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T::ActionResult, FrameworkError<T::Error>>) {
        self.expectations.lock().unwrap().push_back(Expectation {
            label: self.label,
            matcher: self.matcher,
            response,
        });
    }
}

// =============================================================================
// LOW-LEVEL HELPERS
// =============================================================================

/// A bare client whose requests land in the returned receiver.
///
/// # Driving it by hand
/// Client wrappers are tested without a running actor: the client sends to a
/// channel the test owns, the test inspects each request and answers through the
/// responder, simulating success or failure deterministically.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Takes the next request off `receiver` if it is an action, together with its
/// responder.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError<T::Error>>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { action, respond_to }) => Some((action, respond_to)),
        _ => None,
    }
}
