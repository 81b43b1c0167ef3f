use crate::framework::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients built on one generic [`ResourceClient`].
///
/// Implementors supply the inner client and the error mapping; `send` does the
/// round trip.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError<T::Error>) -> Self::Error;

    /// Sends one action and waits for its result.
    #[tracing::instrument(skip(self))]
    async fn send(&self, action: T::Action) -> Result<T::ActionResult, Self::Error> {
        tracing::debug!("Sending request");
        self.inner()
            .perform_action(action)
            .await
            .map_err(Self::map_error)
    }
}
