/// HTTP status classification for link-health reporting
///
/// Every recorded fetch outcome falls into one of five buckets keyed by the
/// leading digit of the HTTP status code. Code 0 (never fetched, or a network
/// failure such as a timeout or DNS error) gets its own bucket.
use std::fmt;

/// Coarse status bucket for a recorded URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// No HTTP response: unfetched, timeout, connection or DNS failure
    Unreachable,

    /// 2xx success responses
    Success,

    /// 3xx redirect responses
    Redirect,

    /// 4xx client errors (not found, gone, forbidden)
    ClientError,

    /// 5xx server errors
    ServerError,
}

impl StatusClass {
    /// Classifies a recorded HTTP status code
    ///
    /// Codes outside the 2xx-5xx ranges (including the synthetic 0) land in
    /// `Unreachable`, so every code maps to exactly one bucket.
    pub fn from_code(code: u16) -> Self {
        match code / 100 {
            2 => Self::Success,
            3 => Self::Redirect,
            4 => Self::ClientError,
            5 => Self::ServerError,
            _ => Self::Unreachable,
        }
    }

    /// Returns true if links with this status should be reported as broken
    ///
    /// Redirects are not broken; they resolve somewhere. Unreachable targets
    /// count as broken because the reader of the report cannot follow them.
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Unreachable | Self::ClientError | Self::ServerError)
    }

    /// Bucket key used in summaries: the leading status digit, "0" for unreachable
    pub fn key(&self) -> &'static str {
        match self {
            Self::Unreachable => "0",
            Self::Success => "2",
            Self::Redirect => "3",
            Self::ClientError => "4",
            Self::ServerError => "5",
        }
    }

    /// All buckets, in report order
    ///
    /// Summaries emit every bucket even when its count is zero.
    pub fn all_classes() -> [Self; 5] {
        [
            Self::Unreachable,
            Self::Success,
            Self::Redirect,
            Self::ClientError,
            Self::ServerError,
        ]
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_success_range() {
        assert_eq!(StatusClass::from_code(200), StatusClass::Success);
        assert_eq!(StatusClass::from_code(204), StatusClass::Success);
        assert_eq!(StatusClass::from_code(299), StatusClass::Success);
    }

    #[test]
    fn test_from_code_redirects() {
        assert_eq!(StatusClass::from_code(301), StatusClass::Redirect);
        assert_eq!(StatusClass::from_code(302), StatusClass::Redirect);
        assert_eq!(StatusClass::from_code(308), StatusClass::Redirect);
    }

    #[test]
    fn test_from_code_client_errors() {
        assert_eq!(StatusClass::from_code(404), StatusClass::ClientError);
        assert_eq!(StatusClass::from_code(410), StatusClass::ClientError);
        assert_eq!(StatusClass::from_code(403), StatusClass::ClientError);
    }

    #[test]
    fn test_from_code_server_errors() {
        assert_eq!(StatusClass::from_code(500), StatusClass::ServerError);
        assert_eq!(StatusClass::from_code(503), StatusClass::ServerError);
    }

    #[test]
    fn test_from_code_zero_is_unreachable() {
        assert_eq!(StatusClass::from_code(0), StatusClass::Unreachable);
    }

    #[test]
    fn test_from_code_oddball_codes_are_unreachable() {
        // 1xx never reaches storage in practice, but classification is total
        assert_eq!(StatusClass::from_code(100), StatusClass::Unreachable);
        assert_eq!(StatusClass::from_code(999), StatusClass::Unreachable);
    }

    #[test]
    fn test_is_broken() {
        assert!(StatusClass::Unreachable.is_broken());
        assert!(StatusClass::ClientError.is_broken());
        assert!(StatusClass::ServerError.is_broken());

        assert!(!StatusClass::Success.is_broken());
        assert!(!StatusClass::Redirect.is_broken());
    }

    #[test]
    fn test_keys() {
        assert_eq!(StatusClass::Unreachable.key(), "0");
        assert_eq!(StatusClass::Success.key(), "2");
        assert_eq!(StatusClass::Redirect.key(), "3");
        assert_eq!(StatusClass::ClientError.key(), "4");
        assert_eq!(StatusClass::ServerError.key(), "5");
    }

    #[test]
    fn test_all_classes_complete() {
        let all = StatusClass::all_classes();
        assert_eq!(all.len(), 5);

        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j], "Duplicate class found");
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", StatusClass::Unreachable), "0");
        assert_eq!(format!("{}", StatusClass::ClientError), "4");
    }
}
