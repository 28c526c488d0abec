//! Twin API abstraction.
//!
//! The dashboard talks to the twin REST API through the [`HdtApi`] trait so
//! the polling views can be driven by the real HTTP client or by an
//! in-memory implementation.

mod http;
mod types;

pub use http::HttpApi;
pub use types::{
    DescriptorValue, FieldValue, HdtStatus, PropertyDescriptor, PropertyRecord, PropertyValue,
    Scalar, ValueMap, TIMESTAMP_FIELD,
};

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::ApiError;

/// Read access to the twin REST API.
///
/// # Example
///
/// ```no_run
/// use twinwatch::{HdtApi, HttpApi};
///
/// # tokio_test::block_on(async {
/// let api = HttpApi::new("http://localhost:3000");
/// let twins = api.list_twins().await?;
/// for id in twins {
///     let state = api.twin_state(&id).await?;
///     println!("{}: {} properties", id, state.properties.len());
/// }
/// # Ok::<_, twinwatch::ApiError>(())
/// # });
/// ```
#[async_trait]
pub trait HdtApi: Send + Sync + Debug {
    /// `GET /api/hdt`: ids of all known twins.
    async fn list_twins(&self) -> Result<Vec<String>, ApiError>;

    /// `GET /api/hdt/{id}/state`: the twin's current property snapshot.
    async fn twin_state(&self, id: &str) -> Result<HdtStatus, ApiError>;

    /// `GET /api/hdt/{id}/state/properties`, reduced to property ids.
    async fn twin_properties(&self, id: &str) -> Result<Vec<String>, ApiError>;

    /// Human-readable description of the endpoint, shown in the status bar.
    fn description(&self) -> &str;
}
