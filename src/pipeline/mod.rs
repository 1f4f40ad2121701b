//! Workflow stages for the photo → vector-art pipeline.
//!
//! Each submodule implements exactly one stage, and no stage depends on
//! another except through the plain values (URLs, job ids) handed along
//! the chain. Keeping stages separate makes each independently testable
//! and lets us swap one out (e.g. a different download strategy order)
//! without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ upload ──▶ submit ──▶ poll ──▶ extract ──▶ download
//! (local)  (sign+PUT) (POST)    (GET×N)  (payload)   (proxy→direct)
//! ```
//!
//! 1. [`input`]    — resolve the local image file, sniff its MIME type
//! 2. [`upload`]   — derive a random CDN filename, sign, PUT, build the URL
//! 3. [`submit`]   — POST the generation request; the job is queued
//! 4. [`poll`]     — re-fetch status until terminal, 2 s between checks
//! 5. [`extract`]  — locate the single display URL in the terminal payload
//! 6. [`download`] — ordered fetch strategies + extension inference + save

pub mod download;
pub mod extract;
pub mod input;
pub mod poll;
pub mod submit;
pub mod upload;
