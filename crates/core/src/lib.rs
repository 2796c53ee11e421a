#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! Core library for the litrans CLI.
//!
//! `litrans_core` provides:
//! - quoted-literal extraction via [`extract`]
//! - translation backends via [`providers`]
//! - the line-rewriting pipeline via [`engine`]
//! - shared configuration and request/response types via [`types`]
//!
//! The pipeline reads a source file line by line, finds quoted string
//! literals with a regex heuristic, translates each literal's interior
//! through a pluggable provider, and splices the result back at the
//! literal's recorded offsets. Translation failures are absorbed per
//! literal: the original text stays in place and the run continues.
//!
//! Re-running the tool on its own output is not guaranteed to be a no-op;
//! translating already-translated text with the same source language gives
//! unpredictable results.
//!
//! # Quick Start
//!
//! ```
//! use litrans_core::engine::Engine;
//! use litrans_core::providers::MockProvider;
//! use litrans_core::types::LanguagesConfig;
//!
//! # async fn demo() {
//! let engine = Engine::new(MockProvider, LanguagesConfig::default(), 1);
//! let outcome = engine.translate_line(r#"speak("ola mundo")"#).await;
//! assert_eq!(outcome.text, r#"speak("OLA MUNDO")"#);
//! # }
//! ```

pub mod engine;
pub mod extract;
pub mod providers;
pub mod types;
