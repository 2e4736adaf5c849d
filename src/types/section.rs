use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// The fixed set of portal sections an article can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Pokemon,
    Starwars,
    Lotr,
    Medieval,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Pokemon,
        Section::Starwars,
        Section::Lotr,
        Section::Medieval,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Section::Pokemon => "pokemon",
            Section::Starwars => "starwars",
            Section::Lotr => "lotr",
            Section::Medieval => "medieval",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSection(pub String);

impl fmt::Display for InvalidSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid section: {}", self.0)
    }
}

impl std::error::Error for InvalidSection {}

impl FromStr for Section {
    type Err = InvalidSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pokemon" => Ok(Section::Pokemon),
            "starwars" => Ok(Section::Starwars),
            "lotr" => Ok(Section::Lotr),
            "medieval" => Ok(Section::Medieval),
            other => Err(InvalidSection(other.to_string())),
        }
    }
}

impl ToSql for Section {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Section {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_sections() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>().unwrap(), section);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("anime".parse::<Section>().is_err());
        assert!("".parse::<Section>().is_err());
        assert!("Pokemon".parse::<Section>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Section::Starwars).unwrap();
        assert_eq!(json, "\"starwars\"");
        let back: Section = serde_json::from_str("\"lotr\"").unwrap();
        assert_eq!(back, Section::Lotr);
    }
}
