//! Pipeline stages for URL-to-PDF generation.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the two external dependencies (the advice CLI and the browser)
//! sit behind traits that tests replace with fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ advice ──▶ extract ──▶ merge ──▶ build ──▶ browser
//! (URL)     (CLI)     (hints)    (defaults) (params)  (Chrome → PDF)
//! ```
//!
//! 1. [`input`]  : validate the caller's URL and add `https://` if missing
//! 2. [`advice`] : ask the external AI CLI for capture advice, bounded by a
//!    deadline; the only stage that spawns a process
//! 3. [`extract`]: turn free-form advice into partial hints (embedded JSON
//!    object first, keyword rules on top) and a summary for the response
//! 4. [`merge`]  : overlay hints onto the default recommendation
//! 5. [`build`]  : derive viewport, navigation policy and print options
//! 6. [`browser`]: open a scoped headless session, print, always close

pub mod advice;
pub mod browser;
pub mod build;
pub mod extract;
pub mod input;
pub mod merge;
