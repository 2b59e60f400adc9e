//! Evaluation of the well-formedness classifier against the [W3C XML conformance test suites](https://www.w3.org/XML/Test/).
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_qualifications
)]

pub mod config;
pub mod evaluator;
pub mod exclusions;
pub mod fetch;
pub mod fragments;
pub mod manifest;
pub mod model;
pub mod report;
pub mod suite;
