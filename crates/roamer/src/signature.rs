//! Page signatures for navigation detection.
//!
//! A signature is the first few labels visible on screen joined with `|`. It
//! is cheap and deliberately coarse: two screens with the same dominant text
//! share a signature.

use crate::driver::{DeviceDriver, ElementAttribute};
use crate::locator::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Signature used when nothing labelled is visible or the dump failed
pub const UNKNOWN_SIGNATURE: &str = "unknown";

/// Opaque fingerprint of what is currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSignature(String);

impl PageSignature {
    /// Build from labels in screen order, keeping the first `limit` non-empty ones
    #[must_use]
    pub fn from_labels<I, S>(labels: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kept: Vec<String> = labels
            .into_iter()
            .filter(|l| !l.as_ref().is_empty())
            .take(limit)
            .map(|l| l.as_ref().to_string())
            .collect();
        if kept.is_empty() {
            Self::unknown()
        } else {
            Self(kept.join("|"))
        }
    }

    /// The fallback signature
    #[must_use]
    pub fn unknown() -> Self {
        Self(UNKNOWN_SIGNATURE.to_string())
    }

    /// Signature text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the current screen's signature; never fails
    pub async fn capture<D: DeviceDriver + ?Sized>(driver: &D, limit: usize) -> Self {
        let elements = match driver.find_elements(&Selector::Labelled).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!(error = %e, "signature capture failed");
                return Self::unknown();
            }
        };
        let mut labels = Vec::with_capacity(limit);
        for element in elements.iter().take(limit) {
            let text = driver
                .attribute(element, ElementAttribute::Text)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            let label = if text.is_empty() {
                driver
                    .attribute(element, ElementAttribute::ContentDesc)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_default()
            } else {
                text
            };
            labels.push(label);
        }
        Self::from_labels(labels, limit)
    }
}

impl fmt::Display for PageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
