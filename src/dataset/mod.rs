// src/dataset/mod.rs
pub mod info;
pub mod io;
pub mod prepare;

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

/// The two source corpora the pipeline knows how to prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dataset {
    /// MITRE CVE list export
    Cve,
    /// Vulnerability History Project export
    Vhp,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Cve => "cve",
            Dataset::Vhp => "vhp",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cve" => Ok(Dataset::Cve),
            "vhp" => Ok(Dataset::Vhp),
            other => bail!("Unknown dataset '{}' (expected cve or vhp)", other),
        }
    }
}
