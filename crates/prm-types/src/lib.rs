//! # PRM Types
//!
//! Small validated primitives shared by the PRM crates.
//!
//! - [`NonEmptyText`] for identifiers and names that must carry content
//! - [`Percent`] for attendance values that arrive as loosely formatted strings

/// Errors that can occur when creating validated types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input did not start with an integer
    #[error("not a percentage: {0:?}")]
    NotAPercent(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A whole-number percentage as recorded on a patient record.
///
/// Attendance figures are captured as free text (`"85"`, `"85%"`, `" 40 "`), so parsing
/// is lenient: leading whitespace and an optional sign are accepted, then the leading run of
/// digits is taken and anything after it is ignored. Values are not clamped; a record that
/// says `"120%"` is kept as 120.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Percent(i32);

impl Percent {
    pub const ZERO: Percent = Percent(0);

    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(self) -> i32 {
        self.0
    }

    /// Parses the leading integer of `input`.
    ///
    /// Returns `None` when no digits are found before the first non-numeric character.
    pub fn parse_lenient(input: &str) -> Option<Self> {
        let s = input.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let end = digits
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }

        // Saturate rather than fail on absurdly long digit runs.
        let magnitude = digits[..end]
            .bytes()
            .fold(0i64, |acc, b| {
                (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX))
            });
        let value = if negative { -magnitude } else { magnitude };
        Some(Self(value as i32))
    }

    /// Mean of two percentages, kept fractional so band thresholds stay exact.
    pub fn average(a: Percent, b: Percent) -> f64 {
        (f64::from(a.0) + f64::from(b.0)) / 2.0
    }
}

impl std::str::FromStr for Percent {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Percent::parse_lenient(s).ok_or_else(|| TypesError::NotAPercent(s.to_owned()))
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl serde::Serialize for Percent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

/// Deserialises a percentage from either a string or a number.
///
/// Meant for `Option<Percent>` fields with `#[serde(default, deserialize_with = ...)]`:
/// unparseable text becomes `None` instead of failing the whole record.
pub fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<Percent>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let raw = <Option<Raw> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(Raw::Int(n)) => Some(Percent(n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)),
        Some(Raw::Float(f)) if f.is_finite() => Some(Percent(f.trunc() as i32)),
        Some(Raw::Float(_)) => None,
        Some(Raw::Text(s)) => s.parse().ok(),
    })
}
