// THEORY:
// Human judgement enters the analysis through a single JSON side file that maps
// each photograph's identifier (its date-based file stem, e.g. `2019_05_05`) to
// one of three day-quality classes. Both learners only ask the binary question
// "was it a bad day?", so the three classes collapse to `bad -> 0`, `good/okay -> 1`.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use image::Rgb;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Human-assigned quality of a day's ocean conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayClass {
    Good,
    Okay,
    Bad,
}

impl DayClass {
    pub fn is_bad(self) -> bool {
        self == DayClass::Bad
    }

    /// Target used by the learners.
    pub fn binary_target(self) -> usize {
        if self.is_bad() { 0 } else { 1 }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayClass::Good => "good",
            DayClass::Okay => "okay",
            DayClass::Bad => "bad",
        }
    }

    /// Plot colour: dodgerblue, forestgreen, firebrick.
    pub fn color(self) -> Rgb<u8> {
        match self {
            DayClass::Good => Rgb([30, 144, 255]),
            DayClass::Okay => Rgb([34, 139, 34]),
            DayClass::Bad => Rgb([178, 34, 34]),
        }
    }
}

/// Mapping from image identifier to day class.
#[derive(Debug, Clone, Default)]
pub struct DayClassLabels {
    classes: HashMap<String, DayClass>,
}

impl DayClassLabels {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::LabelsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| Error::LabelsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let classes = serde_json::from_str(text)?;
        Ok(Self { classes })
    }

    pub fn get(&self, id: &str) -> Option<DayClass> {
        self.classes.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<(String, DayClass)> for DayClassLabels {
    fn from_iter<I: IntoIterator<Item = (String, DayClass)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}

/// Identifier of an image file: its stem.
pub fn image_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// File name of the photograph taken on `date`, e.g. `2019_05_05.png`.
pub fn reference_file_name(date: NaiveDate) -> String {
    format!("{}.png", date.format("%Y_%m_%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase_classes() {
        let labels =
            DayClassLabels::parse(r#"{"2019_05_05": "good", "2019_05_06": "okay", "2019_05_07": "bad"}"#)
                .unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get("2019_05_05"), Some(DayClass::Good));
        assert_eq!(labels.get("2019_05_07"), Some(DayClass::Bad));
        assert_eq!(labels.get("2019_05_08"), None);
    }

    #[test]
    fn unknown_class_is_rejected() {
        assert!(DayClassLabels::parse(r#"{"2019_05_05": "stormy"}"#).is_err());
    }

    #[test]
    fn only_bad_days_map_to_zero() {
        assert_eq!(DayClass::Bad.binary_target(), 0);
        assert_eq!(DayClass::Okay.binary_target(), 1);
        assert_eq!(DayClass::Good.binary_target(), 1);
    }

    #[test]
    fn identifiers_and_reference_names() {
        assert_eq!(
            image_id(Path::new("../data/2019_05_05.png")).as_deref(),
            Some("2019_05_05")
        );
        let date = NaiveDate::from_ymd_opt(2019, 5, 5).unwrap();
        assert_eq!(reference_file_name(date), "2019_05_05.png");
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = DayClassLabels::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
