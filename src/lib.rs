//! Email-signature design service.
//!
//! The library owns every piece of signature logic so the HTTP server
//! (`sigstudio-server`) and the command-line client (`sigstudio`) share one
//! implementation.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Signature data model (personal info, social links, images, positions) |
//! | [`drag`] | Pointer-drag state machine that moves positioned elements |
//! | [`templates`] | Template catalog plus HTML and plain-text renderers |
//! | [`imaging`] | Crop/transform pipeline, frame animation, PNG/GIF/data-URL export |
//! | [`storage`] | Object storage with upload tickets and public/private ACL |
//! | [`routes`] | Axum routers for the REST API |
//! | [`rate_limit`] | Sliding-window limiter for upload-ticket requests |
//! | [`config`] | Environment-driven configuration |
//! | [`error`] | Error codes and JSON error responses |
//! | [`state`] | Shared application state |

pub mod config;
pub mod drag;
pub mod error;
pub mod imaging;
pub mod model;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod storage;
pub mod templates;
