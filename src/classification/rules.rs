// src/classification/rules.rs
//
// Layer 1 of the classifier: keyword rules that only decide the cases
// they are certain about. Everything else is Undecided and goes remote.
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDecision {
    Excluded,
    Accepted,
    Undecided,
}

/// Always excluded, with or without a doctor title.
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    // Hospitals
    "hospital", "مستشفى",
    // Sanatoria
    "مصحة",
    // Pharmacies
    "pharmacy", "صيدلية",
    // Labs
    "laboratory", "laboratories", "معمل", "مختبر",
    // Imaging
    "x-ray", "xray", "imaging", "radiology",
    // Companies
    "company", "شركة",
    // Large complexes
    "مجمع",
];

/// Too short for substring matching ("lab" sits inside "Labib",
/// "scan" inside "DentaScan"); matched as whole words only.
pub const EXCLUDE_WHOLE_WORDS: &[&str] = &["lab", "labs", "scan", "scans"];

/// Corporate medical-center phrasing. Excludes untitled names; a titled
/// name carrying it falls through to the canceller check instead.
pub const CORPORATE_PHRASES: &[&str] = &["medical center", "medical centre", "مركز طبي", "مركز صحي"];

/// A doctor title plus any of these is no longer a safe accept.
pub const TITLE_CANCELLERS: &[&str] = &[
    "center", "centre", "centers",
    "مركز",
    "hospital", "مستشفى",
    "معمل",
    "complex", "مجمع",
];

pub const CANCELLER_WHOLE_WORDS: &[&str] = &["lab", "labs", "scan", "scans"];

/// A bilingual set of lower-cased markers: plain substrings plus
/// whole-word tokens compiled into one word-boundary pattern.
pub struct KeywordSet {
    substrings: Vec<&'static str>,
    whole_words: Option<Regex>,
}

impl KeywordSet {
    pub fn new(substrings: &[&'static str], whole_words: &[&'static str]) -> Self {
        let whole_words = if whole_words.is_empty() {
            None
        } else {
            let alternation = whole_words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"\b(?:{})\b", alternation)).expect("valid keyword pattern"))
        };
        Self {
            substrings: substrings.to_vec(),
            whole_words,
        }
    }

    /// First keyword found in an already lower-cased name.
    pub fn find<'a>(&self, lowered: &'a str) -> Option<&'a str> {
        if let Some(keyword) = self.substrings.iter().find(|k| lowered.contains(**k)) {
            let start = lowered.find(*keyword).unwrap_or(0);
            return Some(&lowered[start..start + keyword.len()]);
        }
        self.whole_words
            .as_ref()
            .and_then(|re| re.find(lowered))
            .map(|m| m.as_str())
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.find(lowered).is_some()
    }
}

static EXCLUDE_SET: Lazy<KeywordSet> = Lazy::new(|| KeywordSet::new(EXCLUDE_KEYWORDS, EXCLUDE_WHOLE_WORDS));
static CORPORATE_SET: Lazy<KeywordSet> = Lazy::new(|| KeywordSet::new(CORPORATE_PHRASES, &[]));
static CANCELLER_SET: Lazy<KeywordSet> =
    Lazy::new(|| KeywordSet::new(TITLE_CANCELLERS, CANCELLER_WHOLE_WORDS));

/// English "Dr" / "Dr." as a token.
static ENGLISH_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdr\b").expect("valid title pattern"));
/// دكتور / دكتورة / دكتوره with or without ال. Not دكتوراه (a doctorate).
static ARABIC_FULL_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\p{L}\p{M}])(?:ال)?دكتور[ةه]?(?:[^\p{L}\p{M}]|$)").expect("valid title pattern")
});
/// د. and د/
static ARABIC_SHORT_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\p{L}\p{M}])د\s*[./]").expect("valid title pattern"));

pub fn has_doctor_title(lowered: &str) -> bool {
    ENGLISH_TITLE.is_match(lowered) || ARABIC_FULL_TITLE.is_match(lowered) || ARABIC_SHORT_TITLE.is_match(lowered)
}

/// Strong non-clinic signal: discarded without a remote call.
pub fn is_obviously_not_clinic(name: &str) -> bool {
    let lowered = name.to_lowercase();
    EXCLUDE_SET.matches(&lowered) || (CORPORATE_SET.matches(&lowered) && !has_doctor_title(&lowered))
}

/// Explicit doctor title and no canceller. A clinic-brand word alone
/// ("Clinic", "Clinics") never qualifies.
pub fn is_obviously_a_clinic(name: &str) -> bool {
    let lowered = name.to_lowercase();
    if CANCELLER_SET.matches(&lowered) {
        return false;
    }
    has_doctor_title(&lowered)
}

/// The keyword that excluded `name`, for log lines.
pub fn exclusion_reason(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    EXCLUDE_SET
        .find(&lowered)
        .or_else(|| CORPORATE_SET.find(&lowered))
        .map(|k| k.to_string())
}

pub fn classify_by_rule(name: &str) -> RuleDecision {
    if is_obviously_not_clinic(name) {
        RuleDecision::Excluded
    } else if is_obviously_a_clinic(name) {
        RuleDecision::Accepted
    } else {
        RuleDecision::Undecided
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hospitals_pharmacies_and_labs_are_excluded() {
        for name in [
            "Al Salam Hospital",
            "مستشفى السلام الدولي",
            "El Ezaby Pharmacy",
            "صيدلية العزبي",
            "Alfa Lab",
            "Cairo Scan",
            "Al Borg Laboratories",
            "مصحة النيل للطب النفسي",
            "Nile Medical Company",
            "مجمع عيادات الشروق",
            "Misr Radiology",
        ] {
            assert_eq!(classify_by_rule(name), RuleDecision::Excluded, "{}", name);
        }
    }

    #[test]
    fn test_exclusion_ignores_doctor_title() {
        assert_eq!(classify_by_rule("Dr. Ahmed Lab"), RuleDecision::Excluded);
        assert_eq!(classify_by_rule("Dr. Magdy Hospital"), RuleDecision::Excluded);
        assert_eq!(classify_by_rule("صيدلية د. منى"), RuleDecision::Excluded);
    }

    #[test]
    fn test_short_tokens_match_whole_words_only() {
        assert_eq!(classify_by_rule("Dr. Labib Clinic"), RuleDecision::Accepted);
        assert_eq!(classify_by_rule("DentaScan"), RuleDecision::Undecided);
        assert_eq!(classify_by_rule("Dr. Hany DentaScan"), RuleDecision::Accepted);
        assert_eq!(classify_by_rule("Scan & Go Labs"), RuleDecision::Excluded);
    }

    #[test]
    fn test_doctor_titles_are_accepted() {
        for name in [
            "Dr. Ahmed Samy Dental Clinic",
            "dr mona zaki",
            "Dr. Sarah Nazmy - Psychiatrist",
            "دكتورة شيماء الشبراوي",
            "عيادة الدكتورة سهام أبو حامد",
            "دكتور عاطف خياط",
            "د. أسامة عامر",
            "د/ محمد حسن",
        ] {
            assert_eq!(classify_by_rule(name), RuleDecision::Accepted, "{}", name);
        }
    }

    #[test]
    fn test_canceller_blocks_title_accept() {
        assert_eq!(classify_by_rule("Dr. X Medical Center"), RuleDecision::Undecided);
        assert_eq!(classify_by_rule("Dr. Amr Dental Centre"), RuleDecision::Undecided);
        assert_eq!(classify_by_rule("مركز د. أحمد لطب الأسنان"), RuleDecision::Undecided);
        assert_eq!(classify_by_rule("Dr. Nabil Complex"), RuleDecision::Undecided);
    }

    #[test]
    fn test_untitled_medical_center_is_excluded() {
        assert_eq!(classify_by_rule("Cairo Medical Center"), RuleDecision::Excluded);
        assert_eq!(classify_by_rule("مركز طبي النور"), RuleDecision::Excluded);
    }

    #[test]
    fn test_clinic_brand_without_title_is_undecided() {
        for name in ["Hayat Clinic", "IVORY DENTAL CLINICS", "Prime Clinics", "Dental House"] {
            assert_eq!(classify_by_rule(name), RuleDecision::Undecided, "{}", name);
        }
    }

    #[test]
    fn test_dr_inside_a_word_is_not_a_title() {
        assert_eq!(classify_by_rule("Alexandr Smile Studio"), RuleDecision::Undecided);
        assert_eq!(classify_by_rule("Hydra Beauty"), RuleDecision::Undecided);
    }

    #[test]
    fn test_doctorate_is_not_a_title() {
        assert!(!has_doctor_title("محمد علي دكتوراه جراحة"));
        assert!(has_doctor_title("الدكتوره منى"));
    }

    #[test]
    fn test_diacritic_before_dot_is_not_a_title() {
        assert!(!has_doctor_title("محمّد. للجلدية"));
        assert_eq!(classify_by_rule("محمّد. للجلدية"), RuleDecision::Undecided);
        assert!(!has_doctor_title("ابو الدكتوراهِ"));
        assert!(has_doctor_title("عيادة د. هالة"));
    }

    #[test]
    fn test_canceller_never_accepts() {
        let titles = ["Dr. ", "dr ", "دكتور ", "د. ", "د/"];
        for canceller in TITLE_CANCELLERS.iter().chain(CANCELLER_WHOLE_WORDS.iter()) {
            for title in titles {
                let name = format!("{}Ahmed {}", title, canceller);
                assert_ne!(classify_by_rule(&name), RuleDecision::Accepted, "{}", name);
            }
        }
    }

    #[test]
    fn test_exclusion_reason_names_the_keyword() {
        assert_eq!(exclusion_reason("Al Salam Hospital").as_deref(), Some("hospital"));
        assert_eq!(exclusion_reason("Alfa Lab").as_deref(), Some("lab"));
        assert_eq!(exclusion_reason("Hayat Clinic"), None);
    }
}
