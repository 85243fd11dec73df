//! # Fieldwire Test
//!
//! In-memory adapter for testing fieldwire actions, middleware, and
//! responsors without a server.
//!
//! ## Key Features
//!
//! - **Request Builder**: Fluent API producing a ready [`TestContext`]
//! - **Presence Semantics**: Empty headers and path parameters count as absent
//! - **Recorded Responses**: Status, headers, body, and template renders
//! - **Native Entity**: The request head as `Arc<http::request::Parts>`
//!
//! ## Example
//!
//! ```ignore
//! use fieldwire_test::TestRequest;
//! use http::StatusCode;
//!
//! #[tokio::test]
//! async fn test_login() {
//!     let mut ctx = TestRequest::post("/login?remember=true")
//!         .header("Token", "t-1")
//!         .form_field("user", "ann")
//!         .build()
//!         .unwrap();
//!
//!     handler.call(&mut ctx).await;
//!
//!     ctx.response.assert_status(StatusCode::OK);
//!     assert_eq!(ctx.response.text().unwrap(), "\"welcome ann\"");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/fieldwire-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod request;
mod response;

pub use context::TestContext;
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::{RecordedResponse, RenderedHtml};
