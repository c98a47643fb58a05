use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Player-facing Valorant regions, as reported by the Riot geo service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Na,
    Latam,
    Br,
    Eu,
    Ap,
    Kr,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Na => "na",
            Self::Latam => "latam",
            Self::Br => "br",
            Self::Eu => "eu",
            Self::Ap => "ap",
            Self::Kr => "kr",
        }
    }

    pub fn to_shard(self) -> Shard {
        match self {
            Self::Na | Self::Latam | Self::Br => Shard::Na,
            Self::Eu => Shard::Eu,
            Self::Ap => Shard::Ap,
            Self::Kr => Shard::Kr,
        }
    }
}

impl FromStr for Region {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "na" | "us" => Ok(Self::Na),
            "latam" | "la" => Ok(Self::Latam),
            "br" => Ok(Self::Br),
            "eu" => Ok(Self::Eu),
            "ap" | "apac" => Ok(Self::Ap),
            "kr" => Ok(Self::Kr),
            _ => Err(AppError::InvalidRegion(s.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// PD deployments serving the store endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shard {
    Na,
    Eu,
    Ap,
    Kr,
}

impl Shard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Na => "na",
            Self::Eu => "eu",
            Self::Ap => "ap",
            Self::Kr => "kr",
        }
    }

    pub fn pd_url(&self) -> String {
        format!("https://pd.{}.a.pvp.net", self.as_str())
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
