// Static rule tables for contractor-name normalization.
//
// The tables are plain key-value data (`RuleTables`); `NameRules` is their
// compiled, read-only form. The built-in set is compiled once and shared;
// callers who need extra aliases or suffix patterns build their own
// `NameRules` from settings and hand it to the normalizer.

use crate::config::NameSettings;
use crate::error::{Result, StatsError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Known spellings of organizations that show up under many names.
const ALIASES: &[(&str, &str)] = &[
    // Utilities
    ("PEOPLES GAS", "Peoples Gas"),
    ("PEOPLE GAS", "Peoples Gas"),
    ("PEOPLES GAS LIGHT & COKE", "Peoples Gas"),
    ("PEOPLES GAS LIGHT AND COKE", "Peoples Gas"),
    ("INTEGRYS ENERGY GROUP / PEOPLES GAS", "Peoples Gas"),
    ("INTEGRYS ENERGY GROUP/PEOPLE GAS", "Peoples Gas"),
    ("COMED NORTH", "ComEd"),
    ("COMED", "ComEd"),
    ("COM ED", "ComEd"),
    ("COM-ED", "ComEd"),
    // City departments
    ("DWM", "Department of Water Management"),
    ("CITY OF CHICAGO DEPT OF WATER", "Department of Water Management"),
    ("CITY OF CHICAGO WATER DEPARTMENT", "Department of Water Management"),
    ("CITY OF CHICAGO DEPT OF WATER MANAGEMENT", "Department of Water Management"),
    ("CITY OF CHICAGO WATER DEPT", "Department of Water Management"),
    ("CHICAGO DEPT WATER MANAGEMENT", "Department of Water Management"),
    ("DEPT OF WATER MANAGEMENT", "Department of Water Management"),
    ("CDOT - IN HOUSE CONSTRUCTION", "CDOT - In-House Construction"),
    ("CDOT - IN-HOUSE CONSTRUCTION", "CDOT - In-House Construction"),
    ("CDOT - INHOUSECONSTRUCTION", "CDOT - In-House Construction"),
    ("CDOT-IN HOUSE CONSTRUCTION", "CDOT - In-House Construction"),
    ("CDOT-INHOUSECONSTRUCTION", "CDOT - In-House Construction"),
    ("CDOT-SIGN MANAGEMENT", "CDOT - Sign Management"),
    ("CDOT - SIGN MANAGEMENT", "CDOT - Sign Management"),
    // Construction companies
    ("SEVEN-D CONSTRUCTION", "Seven-D Construction"),
    ("SEVEN D CONSTRUCTION", "Seven-D Construction"),
    ("M & J ASPHALT", "M&J Asphalt"),
    ("M&J ASPHALT", "M&J Asphalt"),
    ("G & V CONST", "G&V Construction"),
    ("G&V CONST", "G&V Construction"),
    ("RELIABLE CONTRACTING & EQUIPMENT", "Reliable Contracting & Equipment"),
    ("RELIABLECONTRACTING&EQUIPMENT", "Reliable Contracting & Equipment"),
    ("RELIABLE CONTRACTING AND EQUIPMENT", "Reliable Contracting & Equipment"),
    ("MILLER PIPELINE", "Miller Pipeline"),
];

/// Entity suffixes recognized at the end of a name, with their display form.
const BUSINESS_SUFFIXES: &[(&str, &str)] = &[
    (r"INC(?:ORPORATED)?", "Inc"),
    (r"LLC", "LLC"),
    (r"CO(?:MPANY)?", "Co"),
    (r"CORP(?:ORATION)?", "Corp"),
    (r"LTD", "Ltd"),
];

const CONNECTOR_WORDS: &[(&str, &str)] = &[
    ("OF", "of"),
    ("AND", "and"),
    ("THE", "the"),
    ("IN", "in"),
    ("AT", "at"),
    ("BY", "by"),
    ("FOR", "for"),
    ("WITH", "with"),
    ("LLC", "LLC"),
    ("INC", "Inc"),
    ("CO", "Co"),
    ("DEPT", "Dept"),
    ("DBA", "dba"),
];

/// Most specific first; only the first match is kept.
const PRESERVE_SUFFIXES: &[&str] = &[r"\(SL-\d+\)", r"\(SL\)", r"\(SEAL\)", r"\(OVERSIZE\)"];

const REMOVE_SUFFIXES: &[&str] = &[
    r"\(HOMEOWNER\)",
    r"\(CONSTRUCTION\)",
    r"\(COMMERCIAL\)",
    r"\(LESSEE\)",
    r"\(LOT OWNER\)",
    r"\(DWM CONTRACT\)",
];

/// Whole-token abbreviation and misspelling patterns.
const ABBREVIATIONS: &[(&str, &str)] = &[
    (r"CONST\.?|CONSTR\.?|CONSTRUCT\.?|CONSTRUC\.?|NSTRUCTION|CONSTUCTION|CONSTRCTION", "CONSTRUCTION"),
    (r"PLBG\.?|PLMBG\.?|PLUMB\.?", "PLUMBING"),
    (r"HTG\.?", "HEATING"),
    (r"EXCAV\.?|EXCAVAT\.?|EXC\.", "EXCAVATING"),
    (r"CONC\.?|CONCRT\.?|CNCRT\.?|CONCRET", "CONCRETE"),
];

static BUILTIN: Lazy<Arc<NameRules>> = Lazy::new(|| {
    Arc::new(NameRules::compile(RuleTables::builtin()).expect("built-in name rules are valid"))
});

static HYPHEN_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Uncompiled rule data.
#[derive(Debug, Clone, Default)]
pub struct RuleTables {
    pub aliases: Vec<(String, String)>,
    pub business_suffixes: Vec<(String, String)>,
    pub connector_words: Vec<(String, String)>,
    pub preserve_suffixes: Vec<String>,
    pub remove_suffixes: Vec<String>,
    pub abbreviations: Vec<(String, String)>,
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

impl RuleTables {
    pub fn builtin() -> Self {
        Self {
            aliases: owned_pairs(ALIASES),
            business_suffixes: owned_pairs(BUSINESS_SUFFIXES),
            connector_words: owned_pairs(CONNECTOR_WORDS),
            preserve_suffixes: PRESERVE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            remove_suffixes: REMOVE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            abbreviations: owned_pairs(ABBREVIATIONS),
        }
    }

    /// Settings entries are applied after the built-ins, so a configured
    /// alias or connector word wins over a built-in one with the same key.
    pub fn merge_settings(&mut self, settings: &NameSettings) {
        self.aliases.extend(settings.aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.connector_words.extend(
            settings
                .connector_words
                .iter()
                .map(|(k, v)| (k.to_uppercase(), v.clone())),
        );
        self.preserve_suffixes.extend(settings.preserve_suffixes.iter().cloned());
        self.remove_suffixes.extend(settings.remove_suffixes.iter().cloned());
    }
}

#[derive(Debug)]
struct BusinessSuffix {
    pattern: Regex,
    canonical: String,
}

#[derive(Debug)]
struct Abbreviation {
    pattern: Regex,
    expansion: String,
}

/// Compiled name rules. Immutable once built.
#[derive(Debug)]
pub struct NameRules {
    aliases: HashMap<String, String>,
    loose_aliases: HashMap<String, String>,
    business_suffixes: Vec<BusinessSuffix>,
    connector_words: HashMap<String, String>,
    preserve_suffixes: Vec<Regex>,
    remove_suffixes: Vec<Regex>,
    abbreviations: Vec<Abbreviation>,
}

fn compile(table: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| StatsError::InvalidPattern {
        table,
        pattern: pattern.to_string(),
        source,
    })
}

/// Upper-case, drop `*` markers and collapse whitespace.
pub(crate) fn clean_key(s: &str) -> String {
    s.to_uppercase()
        .replace('*', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Key with `&` spaced out and hyphen/space runs folded to a single space,
/// so `M&J`, `M & J` and `M-&-J` meet.
fn loose_key(s: &str) -> String {
    HYPHEN_SPACE_RE.replace_all(&s.replace('&', " & "), " ").trim().to_string()
}

impl NameRules {
    /// The shared built-in rule set.
    pub fn builtin() -> Arc<NameRules> {
        Arc::clone(&BUILTIN)
    }

    /// Built-ins plus whatever the settings file adds.
    pub fn with_settings(settings: &NameSettings) -> Result<Self> {
        let mut tables = RuleTables::builtin();
        tables.merge_settings(settings);
        Self::compile(tables)
    }

    pub fn compile(tables: RuleTables) -> Result<Self> {
        let mut aliases = HashMap::new();
        let mut loose_aliases = HashMap::new();
        for (raw, canonical) in &tables.aliases {
            let key = clean_key(raw);
            loose_aliases.insert(loose_key(&key), canonical.clone());
            aliases.insert(key, canonical.clone());
        }
        // Canonical spellings resolve to themselves so re-normalizing an
        // alias output never falls through to the word rules.
        for (_, canonical) in &tables.aliases {
            let key = clean_key(canonical);
            loose_aliases.entry(loose_key(&key)).or_insert_with(|| canonical.clone());
            aliases.entry(key).or_insert_with(|| canonical.clone());
        }

        let business_suffixes = tables
            .business_suffixes
            .iter()
            .map(|(body, canonical)| {
                let pattern = format!(r"(?i)(?:\s*,\s*|\s+)(?:{body})\.?$");
                Ok(BusinessSuffix { pattern: compile("business suffix", &pattern)?, canonical: canonical.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        let preserve_suffixes = tables
            .preserve_suffixes
            .iter()
            .map(|p| compile("preserve suffix", &format!("(?i){p}")))
            .collect::<Result<Vec<_>>>()?;
        let remove_suffixes = tables
            .remove_suffixes
            .iter()
            .map(|p| compile("remove suffix", &format!("(?i){p}")))
            .collect::<Result<Vec<_>>>()?;

        let abbreviations = tables
            .abbreviations
            .iter()
            .map(|(body, expansion)| {
                Ok(Abbreviation {
                    pattern: compile("abbreviation", &format!("^(?:{body})$"))?,
                    expansion: expansion.to_uppercase(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let connector_words: HashMap<String, String> = tables
            .connector_words
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();

        log::debug!(
            "Compiled name rules: {} alias keys, {} connector words, {} abbreviations",
            aliases.len(),
            connector_words.len(),
            abbreviations.len()
        );

        Ok(Self {
            aliases,
            loose_aliases,
            business_suffixes,
            connector_words,
            preserve_suffixes,
            remove_suffixes,
            abbreviations,
        })
    }

    /// Exact match first, then a match ignoring hyphen/space differences.
    pub fn lookup_alias(&self, cleaned: &str) -> Option<&str> {
        self.aliases
            .get(cleaned)
            .or_else(|| self.loose_aliases.get(&loose_key(cleaned)))
            .map(String::as_str)
    }

    /// Removes the first matching preserve pattern and returns it verbatim.
    pub fn extract_preserved(&self, name: &str) -> (String, Option<String>) {
        for pattern in &self.preserve_suffixes {
            if let Some(m) = pattern.find(name) {
                let kept = m.as_str().to_string();
                return (pattern.replace_all(name, "").into_owned(), Some(kept));
            }
        }
        (name.to_string(), None)
    }

    pub fn strip_removable(&self, name: &str) -> String {
        self.remove_suffixes
            .iter()
            .fold(name.to_string(), |acc, p| p.replace_all(&acc, "").into_owned())
    }

    /// Strips a trailing entity suffix, returning the remainder (without
    /// dangling commas) and the suffix's display form. `None` when no suffix
    /// is present or nothing would be left in front of it.
    pub fn strip_business_suffix(&self, name: &str) -> Option<(String, &str)> {
        self.business_suffixes.iter().find_map(|s| {
            let m = s.pattern.find(name)?;
            let rest = name[..m.start()]
                .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
                .to_string();
            if rest.is_empty() {
                return None;
            }
            Some((rest, s.canonical.as_str()))
        })
    }

    pub fn expand_abbreviation(&self, token: &str) -> Option<&str> {
        self.abbreviations
            .iter()
            .find(|a| a.pattern.is_match(token))
            .map(|a| a.expansion.as_str())
    }

    pub fn connector(&self, token: &str) -> Option<&str> {
        self.connector_words.get(token).map(String::as_str)
    }

    pub fn is_connector(&self, token: &str) -> bool {
        self.connector_words.contains_key(token)
    }

    /// Every alias key with its canonical spelling, built-ins included.
    pub fn alias_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
