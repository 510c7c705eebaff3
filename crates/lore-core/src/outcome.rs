//! Outcome: a value that is always renderable, optionally tagged with the
//! failure that forced a fallback.

use crate::error::ProxyError;

/// Result of an external call under the "never fail visibly" policy.
///
/// `Degraded` still carries a value the page can show (a local session id, a
/// human-readable apology) plus the cause, so callers can log the real error.
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { value: T, cause: ProxyError },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, cause: ProxyError) -> Self {
        Outcome::Degraded { value, cause }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Ok(v) => v,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn cause(&self) -> Option<&ProxyError> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Ok(v) => v,
            Outcome::Degraded { value, .. } => value,
        }
    }

    /// Unwraps the value, logging the cause at warn when degraded.
    pub fn log_degraded(self, operation: &str) -> T {
        match self {
            Outcome::Ok(v) => v,
            Outcome::Degraded { value, cause } => {
                tracing::warn!(
                    target: "lore::outcome",
                    operation = operation,
                    error = %cause,
                    "degraded to fallback value"
                );
                value
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(f(v)),
            Outcome::Degraded { value, cause } => Outcome::Degraded {
                value: f(value),
                cause,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_keeps_value_and_cause() {
        let out = Outcome::degraded("fallback".to_string(), ProxyError::MissingApiKey);
        assert!(out.is_degraded());
        assert!(matches!(out.cause(), Some(ProxyError::MissingApiKey)));
        assert_eq!(out.into_value(), "fallback");
    }

    #[test]
    fn map_preserves_variant() {
        let ok: Outcome<usize> = Outcome::Ok(2);
        assert!(!ok.map(|n| n * 2).is_degraded());

        let bad = Outcome::degraded(1usize, ProxyError::EmptyAnswer).map(|n| n + 1);
        assert_eq!(*bad.value(), 2);
        assert!(bad.is_degraded());
    }
}
