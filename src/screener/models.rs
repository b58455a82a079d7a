// src/screener/models.rs
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Map that keeps document order and serializes as a JSON object.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Ratio label -> display value, e.g. "High / Low" -> "1,234 / 567".
pub type RatioSet = BTreeMap<String, String>;

/// A period-by-row table. Every row has exactly one value per period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowTable {
    pub periods: Vec<String>,
    pub rows: OrderedMap<Vec<String>>,
}

impl RowTable {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() && self.rows.is_empty()
    }
}

/// Schedule name -> drill-down rows behind one summary row.
pub type ExpandedSchedule = OrderedMap<RowTable>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuarterlyTable {
    #[serde(flatten)]
    pub table: RowTable,
    pub expanded: ExpandedSchedule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerHeader {
    pub name: String,
    pub unit: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerCompany {
    pub id: String,
    pub name: String,
    pub url: String,
    pub metrics: OrderedMap<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerMedian {
    pub metrics: OrderedMap<String>,
    pub sector: String,
    pub industry: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerTable {
    pub headers: Vec<PeerHeader>,
    pub companies: Vec<PeerCompany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<PeerMedian>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthKind {
    Sales,
    Profit,
    StockPrice,
    Roe,
}

impl GrowthKind {
    /// Positional order of the growth sub-tables on the page.
    pub const ALL: [GrowthKind; 4] = [
        GrowthKind::Sales,
        GrowthKind::Profit,
        GrowthKind::StockPrice,
        GrowthKind::Roe,
    ];
}

/// Growth kind -> period label ("10 Years") -> percentage ("12%").
pub type GrowthTable = BTreeMap<GrowthKind, OrderedMap<String>>;

/// Everything scraped for one company. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub ratios: RatioSet,
    pub quarterly: QuarterlyTable,
    pub profit_loss: RowTable,
    pub peers: PeerTable,
    pub growth: GrowthTable,
}

/// A resolved company. `canonical_path` is site-relative and opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRef {
    pub display_name: String,
    pub canonical_path: String,
}

/// One search candidate, from either search strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub url: Option<String>,
    pub is_search_everywhere: bool,
}

impl SearchHit {
    pub fn to_company_ref(&self) -> Option<CompanyRef> {
        if self.is_search_everywhere {
            return None;
        }
        self.url.as_ref().map(|url| CompanyRef {
            display_name: self.name.clone(),
            canonical_path: url.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}
