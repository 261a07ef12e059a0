use crate::source::Location;

/// A grammar failure at a known byte position.
///
/// `line` and `column` are zero-based; `Display` renders them one-based the
/// way editors count.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render())]
pub struct SyntaxError {
    pub filename: Option<String>,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(location: &Location, message: impl Into<String>) -> Self {
        SyntaxError {
            filename: location.filename().map(str::to_owned),
            line: location.start_line(),
            column: location.start_column(),
            offset: location.start,
            message: message.into(),
        }
    }

    fn render(&self) -> String {
        match &self.filename {
            Some(name) => format!(
                "{}:{}:{}: {}",
                name,
                self.line + 1,
                self.column + 1,
                self.message
            ),
            None => format!("{}:{}: {}", self.line + 1, self.column + 1, self.message),
        }
    }
}

/// Everything that can go wrong while parsing or loading.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// An alias was found where aliases are not permitted, or its anchor was
    /// never defined.
    #[error("alias `*{0}` is not permitted here")]
    BadAlias(String),
    /// The safe loader met a tag outside the core schema.
    #[error("tag `{0}` is not permitted by the safe loader")]
    DisallowedTag(String),
    #[error("input is not valid UTF-8")]
    NotUtf8,
    /// An asserted invariant failed. This is a bug in the library, not in the
    /// caller's input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Emitter-side failures.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
    /// A mapping key that cannot be rendered in key position.
    #[error("bad mapping key")]
    BadHashmapKey,
    /// The tree needs an alias but aliases are disabled.
    #[error("alias `*{0}` required but aliases are disabled")]
    BadAlias(String),
}

pub type EmitResult = Result<(), EmitError>;
