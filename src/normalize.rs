// Contractor-name canonicalization.
//
// Raw names arrive in every imaginable shape: mixed case, `*` edit
// markers, parenthetical annotations, "AND" vs "&", entity suffixes with
// and without commas and periods, misspellings. `NameNormalizer` folds
// them into one display form so that counts keyed by contractor are not
// split across spelling variants.
//
// The pipeline, in order:
// 1. upper-case, strip `*` markers, collapse whitespace
// 2. pull out one preserved parenthetical suffix (`(SL-1234)`, `(SEAL)`, ...)
// 3. drop noise parentheticals, then any other `(...)` group
// 4. alias lookup, which short-circuits everything below
// 5. `AND` to `&`, abbreviation expansion, alias re-check
// 6. detach a trailing business suffix (`Inc`, `LLC`, `Co`, `Corp`, `Ltd`)
//    and look the remainder up again
// 7. per-word capitalization
// 8. re-attach the business suffix, then the preserved suffix
//
// Every step's output is a fixed point of the steps before it, which is
// what makes a second pass a no-op.

use crate::rules::NameRules;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    rules: Arc<NameRules>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(NameRules::builtin())
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First letter upper, the rest lower.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// True when the token has at least one cased letter and no lowercase ones.
fn is_all_upper(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

/// `&` spaced out and every standalone `AND` token turned into `&`.
fn normalize_conjunctions(s: &str) -> String {
    s.replace('&', " & ")
        .split_whitespace()
        .map(|t| if t == "AND" { "&" } else { t })
        .collect::<Vec<_>>()
        .join(" ")
}

fn attach(base: String, business: Option<&str>, preserved: Option<&str>) -> String {
    let mut out = base;
    for part in [business, preserved].into_iter().flatten() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out.trim().to_string()
}

impl NameNormalizer {
    pub fn new(rules: Arc<NameRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &NameRules {
        &self.rules
    }

    /// Canonical display form of `raw`. Deterministic and idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = collapse_whitespace(&raw.to_uppercase().replace('*', ""));
        if cleaned.is_empty() {
            // Blank or nothing but markers.
            return String::new();
        }

        let (working, preserved) = self.rules.extract_preserved(&cleaned);
        let working = self.rules.strip_removable(&working);
        let working = collapse_whitespace(&PAREN_RE.replace_all(&working, ""));
        let preserved = preserved.as_deref();

        if let Some(canonical) = self.rules.lookup_alias(&working) {
            return attach(canonical.to_string(), None, preserved);
        }

        let rewritten = normalize_conjunctions(&working)
            .split_whitespace()
            .map(|t| self.rules.expand_abbreviation(t).unwrap_or(t))
            .collect::<Vec<_>>()
            .join(" ");
        if rewritten != working {
            if let Some(canonical) = self.rules.lookup_alias(&rewritten) {
                return attach(canonical.to_string(), None, preserved);
            }
        }

        let (base, business) = match self.rules.strip_business_suffix(&rewritten) {
            Some((rest, suffix)) => (rest, Some(suffix)),
            None => (rewritten, None),
        };
        if let Some(suffix) = business {
            // An alias may spell the suffix out; it arrives here in display form.
            let keyed = format!("{} {}", base, suffix.to_uppercase());
            if let Some(canonical) = self.rules.lookup_alias(&keyed) {
                return attach(canonical.to_string(), None, preserved);
            }
            if let Some(canonical) = self.rules.lookup_alias(&base) {
                return attach(canonical.to_string(), business, preserved);
            }
        }

        let formatted = base
            .split_whitespace()
            .enumerate()
            .map(|(i, token)| self.format_word(token, i == 0))
            .collect::<Vec<_>>()
            .join(" ");

        let result = attach(formatted, business, preserved);
        if result.is_empty() {
            // Nothing but noise; keep the cleaned input rather than erase it.
            return cleaned;
        }
        result
    }

    fn format_word(&self, word: &str, first: bool) -> String {
        if word.chars().count() <= 3 && is_all_upper(word) && !self.rules.is_connector(word) {
            return word.to_string();
        }
        if let Some(rest) = word.strip_prefix("MC") {
            return format!("Mc{}", capitalize(rest));
        }
        if let Some(fixed) = self.rules.connector(word) {
            return if first { capitalize(word) } else { fixed.to_string() };
        }
        if word.contains('-') {
            return word.split('-').map(capitalize).collect::<Vec<_>>().join("-");
        }
        capitalize(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        NameNormalizer::default().normalize(s)
    }

    #[test]
    fn known_cases() {
        let cases = [
            ("DWM", "Department of Water Management"),
            ("CITY OF CHICAGO DEPT OF WATER", "Department of Water Management"),
            ("CHICAGO DEPT WATER MANAGEMENT", "Department of Water Management"),
            ("DEPT OF WATER MANAGEMENT", "Department of Water Management"),
            ("SUMIT NSTRUCTION", "Sumit Construction"),
            ("SUMIT CONST", "Sumit Construction"),
            ("CABO NSTRUCTION", "Cabo Construction"),
            ("CABO CONST", "Cabo Construction"),
            ("PEOPLES GAS", "Peoples Gas"),
            ("PEOPLE GAS", "Peoples Gas"),
            ("PEOPLES GAS LIGHT & COKE", "Peoples Gas"),
            ("INTEGRYS ENERGY GROUP / PEOPLES GAS", "Peoples Gas"),
            ("ACME CONSTRUCTION INC.", "Acme Construction Inc"),
            ("ACME CONSTRUCTION INCORPORATED", "Acme Construction Inc"),
            ("ACME CONST. CO.", "Acme Construction Co"),
            ("ACME CONSTRUCTION COMPANY", "Acme Construction Co"),
            ("ABC PLBG & HTG", "ABC Plumbing & Heating"),
            ("XYZ EXCAV. & CONST.", "XYZ Excavating & Construction"),
            ("SMITH CONSTR. (SL-1234)", "Smith Construction (SL-1234)"),
            ("JONES PLBG (SEAL)", "Jones Plumbing (SEAL)"),
            ("chicago concrete", "Chicago Concrete"),
            ("CHICAGO CONCRETE", "Chicago Concrete"),
            ("Chicago Concrete", "Chicago Concrete"),
            ("A AND B CONSTRUCTION", "A & B Construction"),
            ("A&B CONSTRUCTION", "A & B Construction"),
            ("A & B CONST", "A & B Construction"),
            ("SEVEN-D CONSTRUCTION CO*", "Seven-D Construction Co"),
            ("M & J ASPHALT *", "M&J Asphalt"),
            ("PLUMBING PROFESSIONALS*", "Plumbing Professionals"),
            ("CABO CONSTRUCTION CORP*", "Cabo Construction Corp"),
        ];
        for (raw, expected) in cases {
            assert_eq!(norm(raw), expected, "normalizing {raw:?}");
        }
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(norm(""), "");
    }

    #[test]
    fn aliases_ignore_case_and_separators() {
        for raw in ["COMED", "comed", "Com Ed", "com-ed", "COM  ED*", "ComEd"] {
            assert_eq!(norm(raw), "ComEd", "normalizing {raw:?}");
        }
    }

    #[test]
    fn alias_keeps_preserved_suffix() {
        assert_eq!(norm("COM-ED (SL-77)"), "ComEd (SL-77)");
        assert_eq!(norm("DWM (OVERSIZE)**"), "Department of Water Management (OVERSIZE)");
    }

    #[test]
    fn noise_parentheticals_removed() {
        assert_eq!(norm("ABC CO (HOMEOWNER)"), "ABC Co");
        assert_eq!(norm("JOHNSON PAVING (LOT OWNER)"), "Johnson Paving");
        assert_eq!(norm("LAKESIDE PAVING (SOMETHING ELSE)"), "Lakeside Paving");
    }

    #[test]
    fn connector_words_lowercased_except_first() {
        assert_eq!(norm("THE BOARD OF TRADE"), "The Board of Trade");
        assert_eq!(norm("SMITH DBA JONES"), "Smith dba Jones");
    }

    #[test]
    fn mc_names_and_hyphens() {
        assert_eq!(norm("MCDONALD EXCAVATING"), "McDonald Excavating");
        assert_eq!(norm("SMITH-JONES PAVING"), "Smith-Jones Paving");
    }

    #[test]
    fn short_uppercase_tokens_kept() {
        assert_eq!(norm("JKL UTILITY SVC"), "JKL Utility SVC");
    }

    #[test]
    fn suffix_ordering_is_business_then_preserved() {
        assert_eq!(norm("ACME (SEAL), INC."), "Acme Inc (SEAL)");
    }

    #[test]
    fn alias_rechecked_after_rewriting() {
        assert_eq!(norm("M AND J ASPHALT"), "M&J Asphalt");
        assert_eq!(norm("M AND J ASPHALT, LLC"), "M&J Asphalt LLC");
    }

    #[test]
    fn noise_only_input_is_not_erased() {
        assert_eq!(norm("(homeowner)"), "(HOMEOWNER)");
        assert_eq!(norm("(homeowner)*"), "(HOMEOWNER)");
        assert_eq!(norm("   "), "");
    }

    #[test]
    fn marker_only_input_collapses_to_empty() {
        assert_eq!(norm("*"), "");
        assert_eq!(norm("**"), "");
        assert_eq!(norm(" * * "), "");
    }

    #[test]
    fn ampersand_before_suffix() {
        assert_eq!(norm("SMITH&COMPANY"), "Smith & Co");
        assert_eq!(norm("SMITH & COMPANY"), "Smith & Co");
        assert_eq!(norm("BROWN&CO."), "Brown & Co");
        assert_eq!(norm("JONES &INCORPORATED"), "Jones & Inc");
    }

    #[test]
    fn every_and_token_becomes_ampersand() {
        assert_eq!(norm("A AND AND B PAVING"), "A & & B Paving");
        assert_eq!(norm("SMITH AND SONS AND DAUGHTERS"), "Smith & Sons & Daughters");
    }

    #[test]
    fn commas_before_suffix_are_dropped() {
        assert_eq!(norm("ACME,, LTD"), "Acme Ltd");
        assert_eq!(norm("ACME , INC."), "Acme Inc");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "SEVEN-D CONSTRUCTION CO*",
            "M & J ASPHALT *",
            "ACME (SEAL), INC.",
            "THE BOARD OF TRADE",
            "of counsel llc",
            "MCDONALD EXCAVATING",
            "COM-ED (SL-77)",
            "G & V CONST.",
            "(homeowner)",
            "**",
            "o'brien & sons",
            "SMITH&COMPANY",
            "BROWN&CO.",
            "A AND AND B PAVING",
        ];
        for raw in inputs {
            let once = norm(raw);
            assert_eq!(norm(&once), once, "re-normalizing {raw:?}");
        }
    }

    /// Deterministic xorshift, so generated names are identical every run.
    struct Picker(u64);

    impl Picker {
        fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            items[(self.0 % items.len() as u64) as usize]
        }
    }

    const WORDS: &[&str] = &[
        "SMITH", "MCDONALD", "A", "JKL", "OF", "THE", "AND", "CONST", "EXC.", "SEVEN-D", "M",
        "J", "ASPHALT", "CO.", "PLBG", "O'BRIEN", "123", "com", "ed", "Inc", "DBA", "Co",
    ];
    const JOINERS: &[&str] = &[" ", " & ", "&", " AND ", " AND AND ", "-", ", ", " , ", " "];
    const SUFFIXES: &[&str] = &[
        "", " CO", "&CO.", "&COMPANY", " COMPANY", ", INC.", " &INCORPORATED", " LLC", ",, LTD",
        " CORP", " CO INC", " CORPORATION.", " AND CO", "",
    ];
    const DECORATIONS: &[&str] = &[
        "", "*", "**", " (SL-12)", " (SL)", " (HOMEOWNER)", " (SEAL) (SL)", " (NOTE)",
        " (OVERSIZE)*", "",
    ];

    fn generated_names(count: usize) -> Vec<String> {
        let mut p = Picker(0x9E37_79B9_7F4A_7C15);
        (0..count)
            .map(|i| {
                let mut name = p.pick(WORDS).to_string();
                for _ in 0..(1 + i % 3) {
                    name.push_str(p.pick(JOINERS));
                    name.push_str(p.pick(WORDS));
                }
                name.push_str(p.pick(SUFFIXES));
                name.push_str(p.pick(DECORATIONS));
                name
            })
            .collect()
    }

    #[test]
    fn idempotent_over_generated_names() {
        let n = NameNormalizer::default();
        for raw in generated_names(3000) {
            let once = n.normalize(&raw);
            assert_eq!(n.normalize(&once), once, "re-normalizing {raw:?}");
        }
    }

    #[test]
    fn markers_do_not_matter_over_generated_names() {
        let n = NameNormalizer::default();
        for raw in generated_names(500) {
            let plain = n.normalize(&raw);
            assert_eq!(n.normalize(&format!("{raw}*")), plain, "{raw:?}");
            assert_eq!(n.normalize(&format!("{raw}**")), plain, "{raw:?}");
        }
    }

    #[test]
    fn markers_do_not_matter() {
        for s in ["ACME PAVING", "ComEd", "SMITH CONSTR. (SL-1234)", "chicago concrete"] {
            assert_eq!(norm(&format!("{s}*")), norm(s));
            assert_eq!(norm(&format!("{s}**")), norm(s));
        }
    }

    #[test]
    fn every_alias_key_resolves() {
        let n = NameNormalizer::default();
        for (key, canonical) in n.rules().alias_pairs() {
            assert_eq!(n.normalize(key), canonical, "alias key {key:?}");
            assert_eq!(n.normalize(&key.to_lowercase()), canonical, "alias key {key:?} lowercased");
        }
    }

    #[test]
    fn every_alias_key_resolves_with_separators_swapped() {
        let n = NameNormalizer::default();
        for (key, canonical) in n.rules().alias_pairs() {
            let swapped: String = key
                .chars()
                .map(|c| match c {
                    '-' => ' ',
                    ' ' => '-',
                    c => c,
                })
                .collect();
            assert_eq!(n.normalize(&swapped), canonical, "alias key {key:?} as {swapped:?}");
            assert_eq!(n.normalize(&format!("{swapped}*")), canonical, "alias key {key:?} as {swapped:?}*");
        }
    }
}
