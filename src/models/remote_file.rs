use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// A compressed raster discovered on the directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub url: Url,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }

    pub fn dekad(&self) -> Option<DekadId> {
        DekadId::parse(&self.name)
    }
}

/// Name of the last file considered processed.
///
/// Comparison is plain string ordering: a file is admitted only when its name
/// sorts strictly after the bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark(Option<String>);

impl Bookmark {
    pub fn new(last_processed: Option<String>) -> Self {
        Self(last_processed.filter(|s| !s.is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn admits(&self, file_name: &str) -> bool {
        match &self.0 {
            Some(last) => file_name > last.as_str(),
            None => true,
        }
    }
}

/// Year, month and dekad (1..=3) encoded in a CHIRPS file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DekadId {
    pub year: i32,
    pub month: u32,
    pub dekad: u32,
}

impl DekadId {
    /// Parse `chirps-v2.0.YYYY.MM.D.tif[.gz]`
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_prefix("chirps-v2.0.")?;
        let mut parts = stem.split('.');

        let year = parts.next()?.parse::<i32>().ok()?;
        let month = parts.next()?.parse::<u32>().ok()?;
        let dekad = parts.next()?.parse::<u32>().ok()?;

        if !(1..=12).contains(&month) || !(1..=3).contains(&dekad) {
            return None;
        }
        if parts.next() != Some("tif") {
            return None;
        }

        Some(Self { year, month, dekad })
    }

    /// First day of the ten-day period (1st, 11th or 21st)
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1 + (self.dekad - 1) * 10)
    }
}

impl std::fmt::Display for DekadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02} dekad {}", self.year, self.month, self.dekad)
    }
}
