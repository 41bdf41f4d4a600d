//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Body, ContentType, Error, Method, QueryValues, Request, RequestOption, Response, Result,
    from_json, request_option, to_form, to_json,
};
