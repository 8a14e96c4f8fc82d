//! Human explanations for QuickBooks error codes.
//!
//! Each code carries a single catch-all explanation. Some QuickBooks codes are
//! raised for more than one kind of failure; telling those apart by message
//! text is not supported, so the message argument is currently unused.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// QuickBooks "name already in use" error.
pub const ERR_DUPLICATE_NAME: &str = "3100";

const DUPLICATE_NAME_EXPLANATION: &str = "QuickBooks \"Name\" fields must be unique across all Customers, Vendors, Employees, and Other Names. Is there another Customer, Vendor, Employee, or Other Name with the same name as this record?";

/// A configured explanation for one error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorEntry {
    pub code: String,
    pub description: String,
}

/// Immutable error-code lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    catch_all: BTreeMap<String, String>,
}

impl ErrorDescriptor {
    /// Empty table: every lookup returns "".
    pub fn empty() -> Self {
        Self {
            catch_all: BTreeMap::new(),
        }
    }

    /// Built-in table extended (and overridden) by `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = DescriptorEntry>) -> Self {
        let mut descriptor = Self::default();
        for entry in entries {
            descriptor
                .catch_all
                .insert(entry.code.trim().to_string(), entry.description);
        }
        descriptor
    }

    /// Explanation for `code`, or an empty string when the code is unknown.
    pub fn describe(&self, code: &str, _message: &str) -> String {
        self.catch_all
            .get(code.trim())
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.catch_all.contains_key(code.trim())
    }

    pub fn len(&self) -> usize {
        self.catch_all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catch_all.is_empty()
    }
}

impl Default for ErrorDescriptor {
    fn default() -> Self {
        let mut catch_all = BTreeMap::new();
        catch_all.insert(
            ERR_DUPLICATE_NAME.to_string(),
            DUPLICATE_NAME_EXPLANATION.to_string(),
        );
        Self { catch_all }
    }
}

/// Describe using the built-in table.
pub fn describe(code: &str, message: &str) -> String {
    ErrorDescriptor::default().describe(code, message)
}
