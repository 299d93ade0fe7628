//! Postcode normalization and longest-prefix borough lookup.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::outward_codes::LONDON_OUTWARD_CODES;

/// Length of the inward code (the part after the space), e.g. `6AN`.
pub const INWARD_CODE_LEN: usize = 3;

static LONDON: LazyLock<PostcodeResolver> =
    LazyLock::new(|| PostcodeResolver::from_table(&LONDON_OUTWARD_CODES));

/// Resolves UK postcodes to London borough names.
///
/// Lookups are case and whitespace insensitive. The outward code is matched
/// against the table longest-prefix first, so a table containing both `SW1`
/// and `SW1A` sends `SW1A 1AA` to the `SW1A` entry and `SW1P 3BU` to `SW1`.
#[derive(Debug, Clone, Default)]
pub struct PostcodeResolver {
    table: BTreeMap<String, String>,
    longest_key: usize,
}

impl PostcodeResolver {
    /// Builds a resolver from `(outward code, borough)` pairs.
    ///
    /// Keys are normalized the same way input postcodes are. Later pairs
    /// win over earlier ones with the same normalized key.
    #[must_use]
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let table: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (normalize(k.as_ref()), v.into()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        let longest_key = table.keys().map(|k| k.chars().count()).max().unwrap_or(0);

        Self { table, longest_key }
    }

    /// Builds a resolver over a static lookup table.
    #[must_use]
    pub fn from_table(table: &BTreeMap<&'static str, &'static str>) -> Self {
        Self::new(table.iter().map(|(k, v)| (*k, *v)))
    }

    /// Shared resolver over the built-in Greater London table.
    #[must_use]
    pub fn london() -> &'static Self {
        &LONDON
    }

    /// Number of outward codes known to the resolver.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the resolver has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolves a raw postcode to a borough name.
    ///
    /// Returns `None` for input too short to carry an inward code and for
    /// outward codes with no prefix in the table.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        let normalized = normalize(raw);
        let outward = outward_code(&normalized)?;

        let mut boundaries: Vec<usize> = outward
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .take(self.longest_key)
            .collect();
        boundaries.reverse();

        let found = boundaries
            .into_iter()
            .find_map(|end| self.table.get(&outward[..end]))
            .map(String::as_str);

        if found.is_none() {
            log::debug!("No borough for outward code {outward:?}");
        }

        found
    }
}

/// Upper-cases a postcode and strips every whitespace character.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Splits the outward code off a normalized postcode.
///
/// The inward code is always the last [`INWARD_CODE_LEN`] characters, so
/// anything shorter than four characters has no outward code.
#[must_use]
pub fn outward_code(normalized: &str) -> Option<&str> {
    let len = normalized.chars().count();
    if len <= INWARD_CODE_LEN {
        return None;
    }

    let (split, _) = normalized.char_indices().nth(len - INWARD_CODE_LEN)?;
    Some(&normalized[..split])
}

/// Resolves a postcode against the built-in Greater London table.
#[must_use]
pub fn lookup_borough(raw: &str) -> Option<&'static str> {
    PostcodeResolver::london().resolve(raw)
}
