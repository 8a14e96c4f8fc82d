//! qbstatus configuration.
//!
//! Configuration lives in /etc/qbstatus/config.toml. Every section is
//! optional; a missing file means built-in defaults.
//!
//! ```toml
//! [source]
//! snapshot_path = "/var/lib/qbstatus/snapshot.json"
//!
//! [[thresholds]]
//! floor_secs = 3600
//! severity = "Danger"
//! message = "Offline for %d days, %d hours and %d minutes"
//!
//! [mirror]
//! entity_types = ["Customer", "Invoice"]
//! error_number_column = "qbsql_last_errnum"
//!
//! [[descriptors]]
//! code = "3170"
//! description = "The record is open for editing in QuickBooks."
//! ```

use crate::descriptor::{DescriptorEntry, ErrorDescriptor};
use crate::error::{Result, StatusError};
use crate::escalation::{ThresholdLevel, ThresholdTable};
use crate::mirror::MirrorSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/qbstatus";
const CONFIG_FILE: &str = "config.toml";

/// Data directory (snapshots)
pub const DATA_DIR: &str = "/var/lib/qbstatus";

/// QuickBooks object types the mirror imports, in report order.
pub const DEFAULT_ENTITY_TYPES: &[&str] = &[
    "Account",
    "Bill",
    "BillPaymentCheck",
    "BillPaymentCreditCard",
    "Check",
    "Class",
    "CreditCardCharge",
    "CreditCardCredit",
    "CreditMemo",
    "Customer",
    "CustomerType",
    "Deposit",
    "Employee",
    "Estimate",
    "InventoryAdjustment",
    "Invoice",
    "ItemDiscount",
    "ItemInventory",
    "ItemInventoryAssembly",
    "ItemNonInventory",
    "ItemOtherCharge",
    "ItemService",
    "JournalEntry",
    "PaymentMethod",
    "PurchaseOrder",
    "ReceivePayment",
    "SalesOrder",
    "SalesReceipt",
    "SalesRep",
    "ShipMethod",
    "Terms",
    "Vendor",
    "VendorCredit",
];

/// Where report data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DATA_DIR).join("snapshot.json")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Mirror pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<String>,

    #[serde(flatten)]
    pub schema: MirrorSchema,
}

fn default_entity_types() -> Vec<String> {
    DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            entity_types: default_entity_types(),
            schema: MirrorSchema::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub source: SourceConfig,

    /// Custom threshold table; empty means the built-in one
    #[serde(default)]
    pub thresholds: Vec<ThresholdLevel>,

    #[serde(default)]
    pub mirror: MirrorConfig,

    /// Extra error explanations merged over the built-in table
    #[serde(default)]
    pub descriptors: Vec<DescriptorEntry>,
}

impl StatusConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn threshold_table(&self) -> Result<ThresholdTable> {
        ThresholdTable::from_levels_or_default(self.thresholds.clone())
    }

    pub fn error_descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor::with_entries(self.descriptors.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for entity_type in &self.mirror.entity_types {
            if entity_type.trim().is_empty() {
                return Err(StatusError::Config("empty entity type name".to_string()));
            }
            if !seen.insert(entity_type.as_str()) {
                return Err(StatusError::Config(format!(
                    "duplicate entity type: {}",
                    entity_type
                )));
            }
        }
        self.threshold_table().map(|_| ())
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}
