// Library root
// -----------
// This crate exposes the pieces the `bundle-uploader` binary is built from.
//
// Module responsibilities:
// - `api`: the blocking HTTP client that POSTs one bundle body to the FHIR
//   endpoint, plus the `BundleSink` trait the uploader talks to.
// - `bundle`: discovery of the bundle files in the source directory.
// - `uploader`: the sequential print-then-POST loop.
// - `convert`: turns a cBioPortal clinical TSV into FHIR transaction bundles.
// - `cli`, `config`, `logging`: argument parsing, resolved settings and the
//   tracing subscriber setup used by `main.rs`.
pub mod api;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod convert;
pub mod logging;
pub mod uploader;
