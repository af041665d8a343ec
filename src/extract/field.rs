//! Best-effort field accessors.
//!
//! Nothing in here returns an error. A missing element yields the caller's
//! default; any other lookup fault is logged at debug and yields the default
//! too, so one broken field never aborts the surrounding extraction.

use crate::browser::{Element, Lookup, LookupKind, Scope};
use crate::error::BrowserError;
use tracing::debug;

/// Read a single field under `scope`, or `default` when it cannot be read.
pub async fn extract_field<S: Scope>(scope: &S, lookup: &Lookup, default: &str) -> String {
    let value = match scope.find(&lookup.locator).await {
        Ok(element) => read(&element, lookup.kind).await,
        Err(e) => Err(e),
    };

    match value {
        Ok(Some(value)) => value,
        Ok(None) => default.to_string(),
        Err(e) if e.is_not_found() => default.to_string(),
        Err(e) => {
            debug!(%lookup, error = %e, "Field lookup failed; using default");
            default.to_string()
        }
    }
}

/// Evaluate `strategies` in order and return the first non-empty value.
///
/// Later strategies are never looked up once one matches.
pub async fn first_match<S: Scope>(scope: &S, strategies: &[Lookup]) -> Option<String> {
    for lookup in strategies {
        let value = extract_field(scope, lookup, "").await;
        if !value.is_empty() {
            debug!(%lookup, "Strategy matched");
            return Some(value);
        }
    }
    None
}

async fn read<E: Element>(element: &E, kind: LookupKind) -> Result<Option<String>, BrowserError> {
    match kind {
        LookupKind::Text => Ok(Some(element.text().await?.trim().to_string())),
        LookupKind::AttributeSource => element.attribute("src").await,
    }
}
