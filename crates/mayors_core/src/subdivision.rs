use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subdivision {
    pub code: &'static str,
    pub name: &'static str, // search term sent to the directory
}

/// States, districts and territories covered by the directory, ordered by code.
pub const SUBDIVISIONS: &[Subdivision] = &[
    Subdivision { code: "AK", name: "Alaska" },
    Subdivision { code: "AL", name: "Alabama" },
    Subdivision { code: "AR", name: "Arkansas" },
    Subdivision { code: "AS", name: "American Samoa" },
    Subdivision { code: "AZ", name: "Arizona" },
    Subdivision { code: "CA", name: "California" },
    Subdivision { code: "CO", name: "Colorado" },
    Subdivision { code: "CT", name: "Connecticut" },
    Subdivision { code: "DC", name: "District of Columbia" },
    Subdivision { code: "DE", name: "Delaware" },
    Subdivision { code: "FL", name: "Florida" },
    Subdivision { code: "GA", name: "Georgia" },
    Subdivision { code: "GU", name: "Guam" },
    Subdivision { code: "HI", name: "Hawaii" },
    Subdivision { code: "IA", name: "Iowa" },
    Subdivision { code: "ID", name: "Idaho" },
    Subdivision { code: "IL", name: "Illinois" },
    Subdivision { code: "IN", name: "Indiana" },
    Subdivision { code: "KS", name: "Kansas" },
    Subdivision { code: "KY", name: "Kentucky" },
    Subdivision { code: "LA", name: "Louisiana" },
    Subdivision { code: "MA", name: "Massachusetts" },
    Subdivision { code: "MD", name: "Maryland" },
    Subdivision { code: "ME", name: "Maine" },
    Subdivision { code: "MI", name: "Michigan" },
    Subdivision { code: "MN", name: "Minnesota" },
    Subdivision { code: "MO", name: "Missouri" },
    Subdivision { code: "MP", name: "N. Mariana Islands" },
    Subdivision { code: "MS", name: "Mississippi" },
    Subdivision { code: "MT", name: "Montana" },
    Subdivision { code: "NC", name: "North Carolina" },
    Subdivision { code: "ND", name: "North Dakota" },
    Subdivision { code: "NE", name: "Nebraska" },
    Subdivision { code: "NH", name: "New Hampshire" },
    Subdivision { code: "NJ", name: "New Jersey" },
    Subdivision { code: "NM", name: "New Mexico" },
    Subdivision { code: "NV", name: "Nevada" },
    Subdivision { code: "NY", name: "New York" },
    Subdivision { code: "OH", name: "Ohio" },
    Subdivision { code: "OK", name: "Oklahoma" },
    Subdivision { code: "OR", name: "Oregon" },
    Subdivision { code: "PA", name: "Pennsylvania" },
    Subdivision { code: "PR", name: "Puerto Rico" },
    Subdivision { code: "RI", name: "Rhode Island" },
    Subdivision { code: "SC", name: "South Carolina" },
    Subdivision { code: "SD", name: "South Dakota" },
    Subdivision { code: "TN", name: "Tennessee" },
    Subdivision { code: "TX", name: "Texas" },
    Subdivision { code: "UT", name: "Utah" },
    Subdivision { code: "VA", name: "Virginia" },
    Subdivision { code: "VI", name: "Virgin Islands" },
    Subdivision { code: "VT", name: "Vermont" },
    Subdivision { code: "WA", name: "Washington" },
    Subdivision { code: "WI", name: "Wisconsin" },
    Subdivision { code: "WV", name: "West Virginia" },
    Subdivision { code: "WY", name: "Wyoming" },
];

pub fn lookup(code: &str) -> Option<&'static Subdivision> {
    let code = code.trim();
    SUBDIVISIONS
        .iter()
        .find(|s| s.code.eq_ignore_ascii_case(code))
}

/// Resolves user-supplied codes in the order given, dropping repeats.
/// An empty list selects every subdivision.
pub fn resolve(codes: &[String]) -> Result<Vec<&'static Subdivision>> {
    if codes.is_empty() {
        return Ok(SUBDIVISIONS.iter().collect());
    }
    let mut out: Vec<&'static Subdivision> = Vec::with_capacity(codes.len());
    for code in codes {
        let sub = lookup(code).ok_or_else(|| anyhow!("Unknown state code: {code}"))?;
        if !out.contains(&sub) {
            out.push(sub);
        }
    }
    Ok(out)
}
