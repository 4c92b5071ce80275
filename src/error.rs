use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every failure this library can report.
///
/// Only hard failures are represented here. Conditions that a compiler reports as
/// warnings (conflicting or malformed checksum pragmas, ignored `#line` directives)
/// are collected in [`crate::Diagnostics`] and never abort an emit. Size limits on
/// constant strings and dynamic flag lists are applied silently and produce neither.
///
/// # Error Categories
///
/// ## Builder invariant violations
/// - [`Error::Malformed`] - Internal invariant broken while building a method
/// - [`Error::InvalidScope`] - Scope events arrived out of order or overlap
/// - [`Error::SequencePointOrder`] - A sequence point offset went backwards
/// - [`Error::UnknownSource`] - A span referenced a source that was never added
/// - [`Error::InvalidConstant`] - A constant literal could not be represented
///
/// ## Decoding
/// - [`Error::OutOfBounds`] - A blob ended before a value could be read
///
/// ## Emission
/// - [`Error::SymWriter`] - The physical symbol writer failed; the emit is aborted
/// - [`Error::Xml`] - The XML projection could not be produced
///
/// # Examples
///
/// ```rust
/// use symscope::Error;
///
/// fn report(err: &Error) -> String {
///     match err {
///         Error::SymWriter { message } => format!("emit aborted: {message}"),
///         other => other.to_string(),
///     }
/// }
/// # let _ = report(&Error::OutOfBounds);
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An internal invariant was violated.
    ///
    /// Carries the source location in this crate where the violation was detected,
    /// which makes it possible to tell apart the different consistency checks.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was inconsistent
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding a blob.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A scope event violated the nesting rules.
    ///
    /// Scopes must be closed innermost first, children must lie inside their parent
    /// and siblings must not overlap.
    #[error("Invalid scope at IL offset 0x{offset:x} - {message}")]
    InvalidScope {
        /// IL offset of the offending event
        offset: u32,
        /// What went wrong
        message: String,
    },

    /// A sequence point was reported at an IL offset lower than an earlier one.
    #[error("Sequence point at IL offset 0x{offset:x} precedes previous offset 0x{previous:x}")]
    SequencePointOrder {
        /// IL offset of the rejected sequence point
        offset: u32,
        /// IL offset of the last accepted sequence point
        previous: u32,
    },

    /// A span referenced a source id that was never registered with the session.
    #[error("Unknown source - {0}")]
    UnknownSource(u32),

    /// A constant could not be represented (e.g. a decimal with more than 96 bits).
    #[error("Invalid constant value - {0}")]
    InvalidConstant(String),

    /// The physical symbol writer failed.
    ///
    /// This is the only fatal emission error. The whole emit operation is abandoned
    /// and no partial output is produced.
    #[error("Symbol writer failed - {message}")]
    SymWriter {
        /// Description of the underlying failure
        message: String,
    },

    /// Producing the XML projection failed.
    #[error("XML projection failed - {0}")]
    Xml(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
