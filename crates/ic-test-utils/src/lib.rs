//! # IC Test Utilities
//!
//! Shared test utilities for the incident call service.
//!
//! This crate provides:
//! - Server test harness (`TestIcServer` for E2E tests)
//! - Downstream mock (`MockGraph`, a wiremock server standing in for the
//!   identity provider and the calendaring/mail API)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ic_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let graph = MockGraph::start().await;
//!     graph.mount_token_success(1).await;
//!
//!     let server = TestIcServer::spawn(graph.config()).await?;
//!     let response = server
//!         .post_incident(serde_json::json!({ "participants": ["a@x.com"] }))
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod mock_graph;
pub mod server_harness;

// Re-export commonly used items
pub use mock_graph::*;
pub use server_harness::*;
