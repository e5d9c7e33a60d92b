//! Descriptive tag-file content: `bag-info.txt` and `aptrust-info.txt`

use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Access/rights level recorded in `aptrust-info.txt`.
///
/// This is a closed set; any other value is a construction error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Visible to the depositing organization only
    Institution,
    /// Visible to the whole consortium
    Consortia,
    /// Restricted access
    Restricted,
}

impl AccessLevel {
    fn label(&self) -> &'static str {
        match self {
            AccessLevel::Institution => "Institution",
            AccessLevel::Consortia => "Consortia",
            AccessLevel::Restricted => "Restricted",
        }
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Consortia
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "institution" => Ok(AccessLevel::Institution),
            "consortia" => Ok(AccessLevel::Consortia),
            "restricted" => Ok(AccessLevel::Restricted),
            other => Err(Error::invalid_metadata(format!(
                "illegal access value: {:?}",
                other
            ))),
        }
    }
}

/// The two required fields of `aptrust-info.txt`
#[derive(Debug, Clone)]
pub struct AptrustInfo {
    title: String,
    access: AccessLevel,
}

impl AptrustInfo {
    /// Create the info record, failing fast on a missing title
    pub fn new<S: Into<String>>(title: S, access: AccessLevel) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::invalid_metadata("bag title must not be empty"));
        }
        Ok(Self { title, access })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub(crate) fn render(&self) -> String {
        format!("Title : {}\nAccess : {}\n", self.title, self.access)
    }
}

/// The descriptive fields written to `bag-info.txt`.
///
/// Built fluently; every optional field is simply omitted from the tag
/// file when absent.
#[derive(Debug, Clone, Default)]
pub struct BagInfo {
    source_organization: Option<String>,
    bagging_date: OnceLock<String>,
    bag_number: Option<u32>,
    bag_count: Option<u32>,
    bag_group_identifier: Option<String>,
    internal_sender_description: Option<String>,
    internal_sender_identifier: Option<String>,
}

impl BagInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_organization<S: Into<String>>(mut self, org: S) -> Self {
        self.source_organization = Some(org.into());
        self
    }

    /// Set this bag's 1-based sequence number within its group
    pub fn bag_number(mut self, number: u32) -> Self {
        self.bag_number = Some(number);
        self
    }

    /// Set the total number of bags in this group
    pub fn bag_count(mut self, count: u32) -> Self {
        self.bag_count = Some(count);
        self
    }

    pub fn bag_group_identifier<S: Into<String>>(mut self, id: S) -> Self {
        self.bag_group_identifier = Some(id.into());
        self
    }

    pub fn internal_sender_description<S: Into<String>>(mut self, desc: S) -> Self {
        self.internal_sender_description = Some(desc.into());
        self
    }

    pub fn internal_sender_identifier<S: Into<String>>(mut self, id: S) -> Self {
        self.internal_sender_identifier = Some(id.into());
        self
    }

    /// The bagging date as an ISO-8601 UTC timestamp with millisecond
    /// precision. Fixed on first read; every later call returns the same
    /// value for the life of the bag.
    pub fn bagging_date(&self) -> &str {
        self.bagging_date
            .get_or_init(|| Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string())
    }

    /// The "N of M" label for the `Bag-Count` key
    pub fn bag_count_label(&self) -> String {
        format!(
            "{} of {}",
            self.bag_number.unwrap_or(1),
            self.bag_count.unwrap_or(1)
        )
    }

    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        let mut line = |key: &str, value: &str| {
            out.push_str(key);
            out.push_str(" : ");
            out.push_str(value);
            out.push('\n');
        };

        if let Some(org) = &self.source_organization {
            line("Source-Organization", org);
        }
        line("Bagging-Date", self.bagging_date());
        line("Bag-Count", &self.bag_count_label());
        if let Some(id) = &self.bag_group_identifier {
            line("Bag-Group-Identifier", id);
        }
        if let Some(desc) = &self.internal_sender_description {
            line("Internal-Sender-Description", desc);
        }
        if let Some(id) = &self.internal_sender_identifier {
            line("Internal-Sender-Identifier", id);
        }
        out
    }
}
