use crate::constants::MAX_DEPTH;
use crate::error::Severity;

/// Parser and deserializer settings.
#[derive(Debug, Clone)]
pub struct ReadConfig {
    /// Deepest composite nesting the parser accepts.
    pub max_depth: usize,
    /// Report record fields and fixed-size list slots that have no data.
    pub warn_on_missing_data: bool,
    /// Reset record fields and fixed-size list slots that have no data to
    /// their `Default` value instead of keeping what the target held.
    pub default_initialize_missing: bool,
    /// Report object members and array elements the target has no room for.
    pub warn_on_extra_data: bool,
    /// Report missing/extra data as errors instead of warnings.
    pub strict: bool,
    /// Let numeric targets accept `true`/`false` as 1/0.
    pub allow_bool_number_conversion: bool,
}

impl ReadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_warn_on_missing_data(mut self, warn: bool) -> Self {
        self.warn_on_missing_data = warn;
        self
    }

    pub fn with_default_initialize_missing(mut self, default_initialize: bool) -> Self {
        self.default_initialize_missing = default_initialize;
        self
    }

    pub fn with_warn_on_extra_data(mut self, warn: bool) -> Self {
        self.warn_on_extra_data = warn;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_allow_bool_number_conversion(mut self, allow: bool) -> Self {
        self.allow_bool_number_conversion = allow;
        self
    }

    /// Severity used for missing/extra data reports.
    pub fn data_severity(&self) -> Severity {
        if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            warn_on_missing_data: true,
            default_initialize_missing: false,
            warn_on_extra_data: true,
            strict: false,
            allow_bool_number_conversion: false,
        }
    }
}

/// Writer settings. `indent: None` writes compact JSON, `Some(n)` writes one
/// element per line, indenting `n` spaces per nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteConfig {
    pub indent: Option<usize>,
}

impl WriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { indent: None }
    }

    pub fn pretty(indent: usize) -> Self {
        Self {
            indent: Some(indent),
        }
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn is_pretty(&self) -> bool {
        self.indent.is_some()
    }
}
