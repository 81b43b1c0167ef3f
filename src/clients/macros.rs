/// Implements the constructor and [`ActorClient`](crate::clients::ActorClient)
/// for a client that wraps `ResourceClient<Market>`.
///
/// Entity errors pass through untouched; channel failures become
/// `MarketError::ActorCommunicationError`.
macro_rules! impl_market_client {
    ($client_name:ident) => {
        impl $client_name {
            pub fn new(
                inner: $crate::framework::ResourceClient<$crate::market_actor::Market>,
            ) -> Self {
                Self { inner }
            }
        }

        #[async_trait::async_trait]
        impl $crate::clients::ActorClient<$crate::market_actor::Market> for $client_name {
            type Error = $crate::market_actor::MarketError;

            fn inner(&self) -> &$crate::framework::ResourceClient<$crate::market_actor::Market> {
                &self.inner
            }

            fn map_error(
                e: $crate::framework::FrameworkError<$crate::market_actor::MarketError>,
            ) -> Self::Error {
                match e {
                    $crate::framework::FrameworkError::Entity(e) => e,
                    other => $crate::market_actor::MarketError::ActorCommunicationError(
                        other.to_string(),
                    ),
                }
            }
        }
    };
}

pub(crate) use impl_market_client;
