#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! UK postcode to London borough resolution.
//!
//! A postcode such as `E1 6AN` splits into an outward code (`E1`) and a
//! three-character inward code (`6AN`). Boroughs are assigned per outward
//! code, so resolution normalizes the input, drops the inward code and
//! looks the remainder up in [`outward_codes::LONDON_OUTWARD_CODES`].

pub mod outward_codes;
pub mod postcode;

pub use postcode::{PostcodeResolver, lookup_borough, normalize, outward_code};
