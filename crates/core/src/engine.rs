use crate::extract::{find_literals, LiteralMatch};
use crate::providers::{ProviderError, TranslatorProvider};
use crate::types::{LanguagesConfig, TranslateRequest};
use futures::stream::{self, StreamExt};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Fatal pipeline errors. Translation failures never appear here: they are
/// absorbed per literal and reported as warnings.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Result of rewriting one line.
#[derive(Debug, Clone)]
pub struct LineOutcome {
    pub text: String,
    pub warnings: Vec<String>,
    pub literals: usize,
}

/// Ordered output buffer plus run statistics for a whole input.
#[derive(Debug, Default)]
pub struct TranslateReport {
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
    pub literals_seen: usize,
    pub literals_translated: usize,
    pub literals_failed: usize,
}

struct Substitution {
    literal: LiteralMatch,
    replacement: Option<String>,
    warning: Option<String>,
}

/// Main orchestration entry: extract literals per line, translate them
/// through a [`TranslatorProvider`], and splice results back by offset.
pub struct Engine<P>
where
    P: TranslatorProvider,
{
    provider: P,
    languages: LanguagesConfig,
    max_in_flight: usize,
}

impl<P> Engine<P>
where
    P: TranslatorProvider,
{
    /// Constructs an engine for a fixed language pair.
    ///
    /// `max_in_flight` bounds concurrent translation requests within one
    /// line; 1 gives strictly sequential processing. Results are always
    /// applied in literal offset order regardless of arrival order.
    pub fn new(provider: P, languages: LanguagesConfig, max_in_flight: usize) -> Self {
        Self {
            provider,
            languages,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Translates one bare string through the provider, no extraction.
    pub async fn translate_text(&self, text: &str) -> Result<String, ProviderError> {
        let result = self
            .provider
            .translate(TranslateRequest {
                text: text.to_string(),
                source_lang: self.languages.source.clone(),
                target_lang: self.languages.target.clone(),
            })
            .await?;
        Ok(result.text)
    }

    /// Rewrites one line, replacing each quoted literal's interior with its
    /// translation while preserving the delimiters.
    ///
    /// Fail-soft per literal: a failed request leaves that literal's
    /// original text in place, logs the failure to stderr as it happens,
    /// and records a warning for the caller; the rest of the line is still
    /// processed. Replacement splices at the byte offsets recorded
    /// during extraction, so identical literals on one line are each
    /// substituted at their own position.
    ///
    /// # Examples
    ///
    /// ```
    /// use litrans_core::engine::Engine;
    /// use litrans_core::providers::MockProvider;
    /// use litrans_core::types::LanguagesConfig;
    ///
    /// # async fn demo() {
    /// let engine = Engine::new(MockProvider, LanguagesConfig::default(), 1);
    /// let outcome = engine.translate_line(r#"speak("ola")"#).await;
    /// assert_eq!(outcome.text, r#"speak("OLA")"#);
    /// # }
    /// ```
    pub async fn translate_line(&self, line: &str) -> LineOutcome {
        let literals = find_literals(line);
        if literals.is_empty() {
            return LineOutcome {
                text: line.to_string(),
                warnings: Vec::new(),
                literals: 0,
            };
        }

        let count = literals.len();
        let substitutions: Vec<Substitution> = stream::iter(literals)
            .map(|literal| async move {
                let req = TranslateRequest {
                    text: literal.inner.clone(),
                    source_lang: self.languages.source.clone(),
                    target_lang: self.languages.target.clone(),
                };
                match self.provider.translate(req).await {
                    Ok(result) => Substitution {
                        literal,
                        replacement: Some(result.text),
                        warning: None,
                    },
                    Err(err) => {
                        let warning =
                            format!("literal {:?} left untranslated: {err}", literal.inner);
                        eprintln!("warning: {warning}");
                        Substitution {
                            literal,
                            replacement: None,
                            warning: Some(warning),
                        }
                    }
                }
            })
            .buffered(self.max_in_flight)
            .collect()
            .await;

        let mut text = String::with_capacity(line.len());
        let mut warnings = Vec::new();
        let mut cursor = 0;
        for sub in substitutions {
            text.push_str(&line[cursor..sub.literal.start]);
            match &sub.replacement {
                Some(translated) => text.push_str(&sub.literal.requote(translated)),
                None => text.push_str(&line[sub.literal.start..sub.literal.end]),
            }
            cursor = sub.literal.end;
            if let Some(warning) = sub.warning {
                warnings.push(warning);
            }
        }
        text.push_str(&line[cursor..]);

        LineOutcome {
            text,
            warnings,
            literals: count,
        }
    }

    /// Consumes a line reader lazily, in file order, accumulating the
    /// rewritten lines into an ordered buffer. A read error is fatal and
    /// aborts before any output is produced.
    pub async fn translate_reader<R>(&self, reader: R) -> Result<TranslateReport, EngineError>
    where
        R: BufRead,
    {
        let mut report = TranslateReport::default();
        for line in reader.lines() {
            let line = line.map_err(EngineError::Input)?;
            let outcome = self.translate_line(&line).await;
            report.literals_seen += outcome.literals;
            report.literals_failed += outcome.warnings.len();
            report.warnings.extend(outcome.warnings);
            report.lines.push(outcome.text);
        }
        report.literals_translated = report.literals_seen - report.literals_failed;
        Ok(report)
    }

    /// Full file pipeline: read, translate, write, overwrite `output`.
    pub async fn translate_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<TranslateReport, EngineError> {
        let file = File::open(input).map_err(EngineError::Input)?;
        let report = self.translate_reader(BufReader::new(file)).await?;
        write_output(output, &report.lines)?;
        Ok(report)
    }
}

/// Joins the buffered lines with `\n` and writes them in one shot,
/// replacing any existing file. No trailing newline is appended.
pub fn write_output(path: &Path, lines: &[String]) -> Result<(), EngineError> {
    fs::write(path, lines.join("\n")).map_err(EngineError::Output)
}
