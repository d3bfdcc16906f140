//! Engine error types with source-mapped diagnostics

use configbob_core::CoreError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

use crate::suggestions::{
    extract_function_name, extract_variable_name, suggest_undefined_variable,
    suggest_unknown_filter, suggest_unknown_function,
};

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{path} is not valid UTF-8 text, list it in .bobcopy to copy it verbatim")]
    NotText { path: PathBuf },
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{template}: {message}")]
#[diagnostic(code(configbob::template::render))]
pub struct TemplateError {
    /// Name of the failing template (its source path)
    pub template: String,

    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    ///
    /// `data_keys` are the top-level keys of the render context, used for
    /// "did you mean" suggestions on undefined variables.
    pub fn from_minijinja(
        err: minijinja::Error,
        template_name: &str,
        template_source: &str,
        data_keys: &[String],
    ) -> Self {
        let (kind, message) = categorize_minijinja_error(&err);
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));
        let suggestion = generate_suggestion(&err, kind, data_keys);

        Self {
            template: template_name.to_string(),
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    /// Create a simple error without source mapping
    pub fn simple(template_name: &str, message: impl Into<String>) -> Self {
        Self {
            template: template_name.to_string(),
            message: message.into(),
            kind: TemplateErrorKind::Other,
            src: NamedSource::new(template_name, String::new()),
            span: None,
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Categorize a MiniJinja error into our error kinds
fn categorize_minijinja_error(err: &minijinja::Error) -> (TemplateErrorKind, String) {
    let kind = match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => TemplateErrorKind::Other,
    };

    // MiniJinja's alternate display shows the failing expression:
    //    3 >   port: {{ db.prot }}
    //      i            ^^^^^^^ undefined value
    let message = match kind {
        TemplateErrorKind::UndefinedVariable => {
            match extract_expression_from_display(&format!("{:#}", err)) {
                Some(expr) => format!("undefined variable `{}`", expr),
                None => err.to_string().replace("undefined value", "undefined variable"),
            }
        }
        _ => {
            let mut message = err
                .detail()
                .map(String::from)
                .unwrap_or_else(|| err.to_string());
            // Errors raised by library functions carry their cause as source
            if let Some(source) = std::error::Error::source(err) {
                let source = source.to_string();
                if !message.contains(&source) {
                    message = format!("{}: {}", message, source);
                }
            }
            message
        }
    };

    (kind, message)
}

/// Extract the problematic expression from MiniJinja's detailed display
fn extract_expression_from_display(display: &str) -> Option<String> {
    for line in display.lines() {
        let trimmed = line.trim_start();
        if !(trimmed.contains(" > ") || trimmed.starts_with("> ")) {
            continue;
        }
        let start = line.find("{{")?;
        let end = line[start..].find("}}")?;
        let expr = line[start + 2..start + end].trim();
        let expr = expr.split('|').next().unwrap_or(expr).trim();
        if !expr.is_empty() {
            return Some(expr.to_string());
        }
    }
    None
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.lines().enumerate() {
        if index + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

fn generate_suggestion(
    err: &minijinja::Error,
    kind: TemplateErrorKind,
    data_keys: &[String],
) -> Option<String> {
    let msg = err.to_string();

    match kind {
        TemplateErrorKind::UndefinedVariable => {
            let var_name = extract_expression_from_display(&format!("{:#}", err))
                .or_else(|| extract_variable_name(&msg))?;
            // Only the root of `a.b.c` can be matched against top-level keys
            let root = var_name.split(['.', '[']).next().unwrap_or(&var_name);

            if data_keys.iter().any(|k| k == root) {
                return Some(format!(
                    "`{}` exists but `{}` is not defined below it",
                    root, var_name
                ));
            }
            suggest_undefined_variable(root, data_keys).or_else(|| {
                Some(format!(
                    "`{}` is not defined in any data file. Undefined keys are errors.",
                    root
                ))
            })
        }
        TemplateErrorKind::UnknownFunction => extract_function_name(&msg)
            .map(|name| suggest_unknown_function(&name)),
        TemplateErrorKind::UnknownFilter => extract_function_name(&msg)
            .map(|name| suggest_unknown_filter(&name)),
        TemplateErrorKind::SyntaxError => Some(
            "Check bracket matching: `{{ }}` for expressions, `{% %}` for statements, `{# #}` for comments"
                .to_string(),
        ),
        _ => None,
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
