//! Centralized configuration values shared across the Ruby lint pipeline.
//!
//! Each public item in this module documents its purpose and provides a minimal
//! usage example so that downstream crates can remain declarative and avoid
//! scattering literals.

use std::fmt;

/// Number of syntax errors after which the parser stops reporting and stops
/// parsing. The tree built so far is still returned.
///
/// # Examples
/// ```
/// use config::constants::MAX_SYNTAX_ERRORS;
/// assert_eq!(MAX_SYNTAX_ERRORS, 100);
/// ```
pub const MAX_SYNTAX_ERRORS: usize = 100;

/// Deepest expression/statement nesting the parser descends into before it
/// abandons the subtree with a single error.
///
/// # Examples
/// ```
/// use config::constants::MAX_NESTING_DEPTH;
/// assert!(MAX_NESTING_DEPTH >= 64);
/// ```
pub const MAX_NESTING_DEPTH: usize = 512;

/// Remaining stack below which recursive descent grows a new stack segment
/// through the `stacker` crate.
///
/// # Examples
/// ```
/// use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
/// assert!(STACKER_RED_ZONE_BYTES < STACKER_STACK_SIZE_BYTES);
/// ```
pub const STACKER_RED_ZONE_BYTES: usize = 64 * 1024;

/// Bytes of stack space reserved when growing recursion limits using the
/// `stacker` crate.
///
/// # Examples
/// ```
/// use config::constants::STACKER_STACK_SIZE_BYTES;
/// assert!(STACKER_STACK_SIZE_BYTES >= 1024);
/// ```
pub const STACKER_STACK_SIZE_BYTES: usize = 2 * 1024 * 1024;

/// Explicit text reported when a lint run finds no syntax errors.
///
/// # Examples
/// ```
/// use config::constants::NO_ERRORS_MESSAGE;
/// assert_eq!(NO_ERRORS_MESSAGE, "no errors found");
/// ```
pub const NO_ERRORS_MESSAGE: &str = "no errors found";

/// Explicit text reported when a lint run finds no warnings.
///
/// # Examples
/// ```
/// use config::constants::NO_WARNINGS_MESSAGE;
/// assert_eq!(NO_WARNINGS_MESSAGE, "no warnings found");
/// ```
pub const NO_WARNINGS_MESSAGE: &str = "no warnings found";

/// Immutable snapshot of the parser limits for one lint invocation.
///
/// # Examples
/// ```
/// use config::constants::LintLimits;
/// let limits = LintLimits::default();
/// assert!(limits.max_syntax_errors > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LintLimits {
    /// Syntax errors reported before the parser gives up.
    pub max_syntax_errors: usize,
    /// Maximum recursive descent depth.
    pub max_nesting_depth: usize,
}

impl LintLimits {
    /// Builds limits, rejecting values that would disable parsing entirely.
    ///
    /// # Examples
    /// ```
    /// use config::constants::LintLimits;
    /// let limits = LintLimits::new(10, 32).expect("valid limits");
    /// assert_eq!(limits.max_syntax_errors, 10);
    /// ```
    pub fn new(max_syntax_errors: usize, max_nesting_depth: usize) -> Result<Self, ConfigError> {
        if max_syntax_errors == 0 {
            return Err(ConfigError::InvalidErrorCap(max_syntax_errors));
        }
        if max_nesting_depth < 2 {
            return Err(ConfigError::InvalidNestingDepth(max_nesting_depth));
        }
        Ok(Self {
            max_syntax_errors,
            max_nesting_depth,
        })
    }
}

impl Default for LintLimits {
    fn default() -> Self {
        Self {
            max_syntax_errors: MAX_SYNTAX_ERRORS,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Error returned when invalid limit values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when the error cap is zero.
    InvalidErrorCap(usize),
    /// Raised when the nesting depth cannot hold a single statement.
    InvalidNestingDepth(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidErrorCap(value) => {
                write!(f, "max_syntax_errors must be positive: {value}")
            }
            ConfigError::InvalidNestingDepth(value) => {
                write!(f, "max_nesting_depth must be >= 2: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
