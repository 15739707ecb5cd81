use serde::{Deserialize, Serialize};

/// A counterpart the user practices against, with its scenario brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub brief: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub counterparts: Vec<CatalogEntry>,
}

/// Scenario catalog: domains in display order, each with ordered counterparts.
///
/// Loaded once from `scenarios.json` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    domains: Vec<Domain>,
}

impl Catalog {
    pub fn new(domains: Vec<Domain>) -> Self {
        Self { domains }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn first_domain(&self) -> Option<&Domain> {
        self.domains.first()
    }

    pub fn domain(&self, key: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.key == key)
    }

    /// Counterparts for a domain, in catalog order. Unknown domains are empty.
    pub fn counterparts(&self, domain: &str) -> &[CatalogEntry] {
        self.domain(domain)
            .map(|d| d.counterparts.as_slice())
            .unwrap_or(&[])
    }

    pub fn default_counterpart(&self, domain: &str) -> Option<&CatalogEntry> {
        self.counterparts(domain).first()
    }

    pub fn entry(&self, domain: &str, id: &str) -> Option<&CatalogEntry> {
        self.counterparts(domain).iter().find(|e| e.id == id)
    }

    /// Placeholder catalog used when `scenarios.json` is missing or broken.
    pub fn stub() -> Self {
        Self::new(vec![Domain {
            key: "general".to_string(),
            label: "General".to_string(),
            counterparts: vec![CatalogEntry {
                id: "prospect".to_string(),
                label: "Busy prospect".to_string(),
                brief: "A time-pressed decision maker meeting you for the first time. \
                        Skeptical of claims without evidence."
                    .to_string(),
            }],
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{
              "domains": [
                {"key": "oncology", "label": "Oncology", "counterparts": [
                  {"id": "onc-md", "label": "Community oncologist", "brief": "Sees 30 patients a day."},
                  {"id": "onc-pharm", "label": "Oncology pharmacist", "brief": "Owns the formulary."}
                ]},
                {"key": "cardio", "label": "Cardiology", "counterparts": [
                  {"id": "cardio-np", "label": "Cardiology NP"}
                ]}
              ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn counterparts_keep_catalog_order() {
        let c = catalog();
        let ids: Vec<&str> = c.counterparts("oncology").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["onc-md", "onc-pharm"]);
        assert_eq!(c.default_counterpart("oncology").unwrap().id, "onc-md");
    }

    #[test]
    fn unknown_domain_is_empty_without_default() {
        let c = catalog();
        assert!(c.counterparts("dermatology").is_empty());
        assert!(c.default_counterpart("dermatology").is_none());
    }

    #[test]
    fn entry_lookup_is_scoped_to_domain() {
        let c = catalog();
        assert!(c.entry("oncology", "onc-pharm").is_some());
        assert!(c.entry("cardio", "onc-pharm").is_none());
    }

    #[test]
    fn missing_brief_defaults_to_empty() {
        let c = catalog();
        assert_eq!(c.entry("cardio", "cardio-np").unwrap().brief, "");
    }

    #[test]
    fn stub_has_one_selectable_counterpart() {
        let c = Catalog::stub();
        let first = c.first_domain().unwrap();
        assert_eq!(c.counterparts(&first.key).len(), 1);
    }
}
