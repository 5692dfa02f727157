//! Operator-selectable output fields.
//!
//! Every field maps to the upstream attributes it needs in a details request
//! and to the key it is written under in the destination file. Keys are the
//! localized names existing datasets already use, so they must not change.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A recognized output field. Declaration order is the output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Phone,
    Website,
    Address,
    PlaceId,
    Rating,
    TotalRatings,
    OpeningHours,
    PriceLevel,
    Email,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Phone,
        Field::Website,
        Field::Address,
        Field::PlaceId,
        Field::Rating,
        Field::TotalRatings,
        Field::OpeningHours,
        Field::PriceLevel,
        Field::Email,
    ];

    /// Name accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Phone => "phone",
            Field::Website => "website",
            Field::Address => "address",
            Field::PlaceId => "place_id",
            Field::Rating => "rating",
            Field::TotalRatings => "total_ratings",
            Field::OpeningHours => "opening_hours",
            Field::PriceLevel => "price_level",
            Field::Email => "email",
        }
    }

    /// Key used in JSON objects and as the CSV column header.
    pub fn output_key(&self) -> &'static str {
        match self {
            Field::Title => "titulo",
            Field::Phone => "telefono",
            Field::Website => "sitio_web",
            Field::Address => "direccion",
            Field::PlaceId => "place_id",
            Field::Rating => "rating",
            Field::TotalRatings => "total_ratings",
            Field::OpeningHours => "horarios",
            Field::PriceLevel => "nivel_precios",
            Field::Email => "email",
        }
    }

    /// Upstream details attribute this field needs, if any.
    ///
    /// Email has no attribute of its own but needs the website to probe.
    pub fn request_attribute(&self) -> Option<&'static str> {
        match self {
            Field::Title => Some("name"),
            Field::Phone => Some("formatted_phone_number"),
            Field::Website | Field::Email => Some("website"),
            Field::Address => Some("formatted_address"),
            Field::PlaceId => None,
            Field::Rating => Some("rating"),
            Field::TotalRatings => Some("user_ratings_total"),
            Field::OpeningHours => Some("opening_hours"),
            Field::PriceLevel => Some("price_level"),
        }
    }

    /// Whether the field is on when the operator makes no choice.
    pub fn default_selected(&self) -> bool {
        matches!(
            self,
            Field::Title
                | Field::Phone
                | Field::Website
                | Field::Address
                | Field::Rating
                | Field::TotalRatings
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted || f.output_key() == wanted)
            .ok_or_else(|| AppError::ConfigError(format!("Unknown field: {s}")))
    }
}

/// The set of fields a run requests and emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: BTreeSet<Field>,
}

impl FieldSelection {
    /// Build a selection; at least one field is required.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Result<Self, AppError> {
        let fields: BTreeSet<Field> = fields.into_iter().collect();
        if fields.is_empty() {
            return Err(AppError::ConfigError(
                "Select at least one field to extract".into(),
            ));
        }
        Ok(Self { fields })
    }

    /// Parse a comma-separated list such as `"title,phone,email"`.
    pub fn parse(list: &str) -> Result<Self, AppError> {
        let fields = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Field::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(fields)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Selected fields in output column order.
    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.iter().copied()
    }

    /// Output keys in column order; this is the CSV header.
    pub fn output_keys(&self) -> Vec<&'static str> {
        self.iter().map(|f| f.output_key()).collect()
    }

    /// Attributes for the details request. `name` is always included.
    pub fn request_attributes(&self) -> Vec<&'static str> {
        let mut attrs = vec!["name"];
        for attr in self.iter().filter_map(|f| f.request_attribute()) {
            if !attrs.contains(&attr) {
                attrs.push(attr);
            }
        }
        attrs
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            fields: Field::ALL
                .into_iter()
                .filter(Field::default_selected)
                .collect(),
        }
    }
}
