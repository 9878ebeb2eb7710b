use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column order shared by the CSV header and the JSON field order.
pub const CSV_FIELDS: [&str; 10] = [
    "name",
    "email",
    "phone",
    "bio_url",
    "img_url",
    "city",
    "state",
    "population",
    "city_site_url",
    "next_election",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MayorRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>, // `tel:` prefix removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>, // absolute
    pub city: String,
    pub state: String, // two-letter subdivision code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<String>, // digits only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_site_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_election: Option<String>, // YYYY-MM-DD
}

impl MayorRecord {
    /// One CSV row in `CSV_FIELDS` order, absent fields as empty strings.
    pub fn to_row(&self) -> Vec<String> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            self.name.clone(),
            opt(&self.email),
            opt(&self.phone),
            opt(&self.bio_url),
            opt(&self.img_url),
            self.city.clone(),
            self.state.clone(),
            opt(&self.population),
            opt(&self.city_site_url),
            opt(&self.next_election),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MayorRecord {
        MayorRecord {
            name: "Ethan Berkowitz".to_string(),
            email: Some("mayor@muni.org".to_string()),
            phone: Some("907-343-7100".to_string()),
            bio_url: None,
            img_url: None,
            city: "Anchorage".to_string(),
            state: "AK".to_string(),
            population: Some("291538".to_string()),
            city_site_url: None,
            next_election: Some("2021-04-06".to_string()),
        }
    }

    #[test]
    fn row_follows_column_order() {
        let row = sample().to_row();
        assert_eq!(row.len(), CSV_FIELDS.len());
        assert_eq!(row[0], "Ethan Berkowitz");
        assert_eq!(row[3], "");
        assert_eq!(row[6], "AK");
        assert_eq!(row[9], "2021-04-06");
    }

    #[test]
    fn json_keeps_column_order_and_omits_absent_fields() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("bio_url"));
        assert!(!json.contains("img_url"));

        let at = |key: &str| json.find(&format!("\"{key}\":")).unwrap();
        assert!(at("name") < at("email"));
        assert!(at("phone") < at("city"));
        assert!(at("state") < at("population"));
        assert!(at("population") < at("next_election"));
    }
}
