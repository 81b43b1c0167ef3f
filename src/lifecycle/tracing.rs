//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global subscriber. Levels come from
//! `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run
//!
//! # Every action payload as the actor receives it
//! RUST_LOG=debug cargo run
//!
//! # Only the actor loop
//! RUST_LOG=campus_market::framework=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - Actor start and shutdown, with the number of records held
//! - Each action: `debug!` with the payload, `info!` on success, `warn!` with
//!   the error on failure
//! - Client calls, as spans named after the client method
//! - Order and dispute events with the ids involved
//!
//! A checkout at `info` level reads roughly:
//!
//! ```text
//! INFO create_order: Sending create_order to actor
//! INFO Order created order=order_1 number=ORD-20240301-000001 total=20.00
//! INFO Action ok entity_type="Market" size=7
//! ```
//!
//! With [`LogFormat::Json`] the same events are written one JSON object per
//! line.

use crate::lifecycle::LogFormat;
use tracing_subscriber::EnvFilter;

pub fn setup_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false); // entity_type identifies the actor instead

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
