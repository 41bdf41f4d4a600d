//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions for easy
//! glob importing:
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    Body, CallContext, Client, ClientBuilder, ClientOption, ContentType, DebugLogger, Error,
    LifecycleHook, Method, QueryValues, RateLimiter, RequestOption, Response, Result, StatusCode,
    TracingLogger, option, request_option,
};
pub use serde::{Deserialize, Serialize};
