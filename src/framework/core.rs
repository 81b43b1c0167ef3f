//! # Actor core
//!
//! One owner per piece of state, one request at a time.
//!
//! ## Key Types
//!
//! - [`ActorEntity`]: The trait that the state owned by an actor must implement.
//! - [`ResourceActor`]: The generic actor that owns that state and processes requests.
//! - [`ResourceClient`]: The generic client for communicating with actors.
//! - [`FrameworkError`]: Channel failures plus the entity's own error type.

use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// State
// =============================================================================

/// Trait for state that is owned and mutated by a single [`ResourceActor`].
///
/// # Architecture Note
/// The actor owns the state exclusively and feeds it one action at a time, so an
/// implementation can read, validate and write across several of its own
/// collections without locks: nothing else observes the state between the first
/// read and the last write of an action.
///
/// # Async & Context
/// This trait is `#[async_trait]` so hooks can await collaborators. The `Context`
/// is injected when the actor starts ("late binding"), not when it is constructed.
#[async_trait]
pub trait ActorEntity: Send + 'static {
    /// Enum of the operations this state understands.
    type Action: Send + Debug;

    /// Result returned by [`ActorEntity::handle_action`].
    type ActionResult: Send + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// One error type for the whole actor.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once before the first request is processed.
    async fn on_start(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a single action. Returning `Err` must leave the state untouched.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Number of records held, reported in lifecycle logs.
    fn size(&self) -> usize {
        0
    }
}

// =============================================================================
// Messages and errors
// =============================================================================

/// Errors that can occur when talking to an actor.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError<E: std::error::Error + 'static> {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error(transparent)]
    Entity(E),
}

/// Where the actor writes the outcome of one action.
pub type Response<T> = oneshot::Sender<
    Result<<T as ActorEntity>::ActionResult, FrameworkError<<T as ActorEntity>::Error>>,
>;

/// Internal message type sent to the actor.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Action {
        action: T::Action,
        respond_to: Response<T>,
    },
    /// Stop the loop after the requests already queued ahead of this one.
    Shutdown { respond_to: oneshot::Sender<()> },
}

// =============================================================================
// Actor loop
// =============================================================================

/// The generic actor that owns a piece of state.
///
/// **Concurrency Model**:
/// The actor processes its messages *sequentially* in a loop, so the state needs
/// no `Mutex` or `RwLock`. Callers on any number of tasks share the state only by
/// sending messages through a [`ResourceClient`].
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    state: T,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates the actor (server half) and its client.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait when it
    /// is full.
    pub fn new(buffer_size: usize, state: T) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self { receiver, state };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop until the channel closes or a shutdown request
    /// arrives. Returns the final state.
    pub async fn run(mut self, context: T::Context) -> T {
        // Short type name, "Market" rather than "campus_market::market_actor::Market".
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        if let Err(e) = self.state.on_start(&context).await {
            warn!(entity_type, error = %e, "on_start failed");
        }

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Action { action, respond_to } => {
                    debug!(entity_type, ?action, "Action");
                    let result = self
                        .state
                        .handle_action(action, &context)
                        .await
                        .map_err(FrameworkError::Entity);
                    match &result {
                        Ok(_) => info!(entity_type, size = self.state.size(), "Action ok"),
                        Err(e) => warn!(entity_type, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Shutdown { respond_to } => {
                    info!(entity_type, "Shutdown requested");
                    let _ = respond_to.send(());
                    break;
                }
            }
        }

        info!(entity_type, size = self.state.size(), "Shutdown");
        self.state
    }
}

// =============================================================================
// Client
// =============================================================================

/// Sending half of a [`ResourceActor`].
///
/// Holds only a sender, so cloning is cheap.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn perform_action(
        &self,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Action { action, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Asks the actor to stop and waits for the acknowledgement.
    pub async fn shutdown(&self) -> Result<(), FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Shutdown { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // A bounded counter stands in for a real entity.

    #[derive(Debug, Default)]
    struct Counter {
        value: u64,
        limit: u64,
    }

    #[derive(Debug)]
    enum CounterAction {
        Add(u64),
        Read,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("limit {limit} exceeded")]
    struct OverLimit {
        limit: u64,
    }

    #[async_trait]
    impl ActorEntity for Counter {
        type Action = CounterAction;
        type ActionResult = u64;
        type Context = ();
        type Error = OverLimit;

        async fn handle_action(
            &mut self,
            action: CounterAction,
            _ctx: &(),
        ) -> Result<u64, OverLimit> {
            match action {
                CounterAction::Add(n) => {
                    if self.value + n > self.limit {
                        return Err(OverLimit { limit: self.limit });
                    }
                    self.value += n;
                    Ok(self.value)
                }
                CounterAction::Read => Ok(self.value),
            }
        }
    }

    #[tokio::test]
    async fn test_resource_actor_serialises_actions() {
        let (actor, client) = ResourceActor::new(8, Counter { value: 0, limit: 10 });
        let handle = tokio::spawn(actor.run(()));

        let mut tasks = Vec::new();
        for _ in 0..15 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                client.perform_action(CounterAction::Add(1)).await
            }));
        }

        let mut ok = 0;
        let mut rejected = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(FrameworkError::Entity(OverLimit { limit })) => {
                    assert_eq!(limit, 10);
                    rejected += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 10);
        assert_eq!(rejected, 5);
        assert_eq!(client.perform_action(CounterAction::Read).await.unwrap(), 10);

        client.shutdown().await.unwrap();
        let state = handle.await.unwrap();
        assert_eq!(state.value, 10);
    }

    #[tokio::test]
    async fn test_closed_actor_reports_actor_closed() {
        let (actor, client) = ResourceActor::new(1, Counter::default());
        drop(actor);

        let err = client.perform_action(CounterAction::Read).await.unwrap_err();
        assert!(matches!(err, FrameworkError::ActorClosed));
    }
}
