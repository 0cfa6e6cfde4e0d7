//! Request parameter model.
//!
//! Every wire format decodes into the same [`RequestParams`]: a schema of
//! typed parameters, each tagged with a [`ParamKind`] that controls whether it
//! may be set from a request and whether it is serialized back to the wire.
//!
//! # Usage
//!
//! ```
//! use docuserver::params::{RequestParams, FN, PN};
//!
//! let mut params = RequestParams::new();
//! params.set_from_str(FN, "books/vol1").unwrap();
//! params.set_from_str(PN, "not-a-number").unwrap(); // ignored, stays 1
//!
//! assert_eq!(params.page_number(), 1);
//! assert_eq!(params.to_wire_string(), "fn=books/vol1");
//! ```

mod options;
mod request;
mod value;

pub use options::OptionSet;
pub use request::*;
pub use value::{ParamKind, ParamValue, Parameter, ValueType};
