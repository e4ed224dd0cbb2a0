// src/classification/doctor_name.rs
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words that end an English name capture. The word itself is never kept.
/// Arabic stop words end it too, since a Latin title often precedes an
/// Arabic name.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "dental", "dentist", "dentistry", "clinic", "clinics", "center", "centre", "office", "care",
    "surgery", "surgeon", "surgical", "orthodontic", "orthodontics", "orthodontist", "orthopedic",
    "orthopedics", "orthopaedic", "pediatric", "pediatrics", "paediatric", "pediatrician",
    "dermatology", "dermatologist", "cardiology", "cardiologist", "gynecology", "gynecologist",
    "obstetrics", "ent", "eye", "eyes", "ophthalmology", "ophthalmologist", "psychiatry",
    "psychiatrist", "psychologist", "physiotherapy", "physical", "therapy", "plastic", "cosmetic",
    "aesthetic", "aesthetics", "beauty", "skin", "hair", "laser", "smile", "consultant",
    "specialist", "professor", "prof", "md", "phd", "and", "for", "of", "the", "in", "at",
];

/// Specialty, title and connector words stripped from the tail of an
/// Arabic capture. Stored folded (see `fold_arabic`).
const ARABIC_STOP_WORDS: &[&str] = &[
    // Titles
    "د", "دكتور", "دكتوره", "الدكتور", "الدكتوره", "دكتوراه", "استاذ", "استاذه", "الاستاذ",
    "استشاري", "استشاريه", "اخصائي", "اخصائيه", "زميل", "ماجستير", "مدرس",
    // Clinic words
    "عياده", "عيادات", "مركز", "تخصص",
    // Prepositions opening a specialty clause
    "في", "و", "ل", "لل", "لطب", "طب", "الطب", "امراض", "لامراض", "علاج", "لعلاج",
    // Specialties and body parts
    "جراحه", "لجراحه", "الجراحه", "اسنان", "الاسنان", "للاسنان", "باطنه", "الباطنه", "اطفال",
    "الاطفال", "للاطفال", "نساء", "النساء", "توليد", "والتوليد", "عيون", "العيون", "جلديه",
    "الجلديه", "جلد", "عظام", "العظام", "انف", "الانف", "اذن", "واذن", "والاذن", "حنجره",
    "والحنجره", "قلب", "القلب", "مخ", "اعصاب", "والاعصاب", "نفسي", "النفسي", "نفسيه", "مسالك",
    "المسالك", "بوليه", "تجميل", "التجميل", "طبيعي", "كلي", "الكلي", "صدر", "الصدر", "سمنه",
    "تغذيه",
];

/// Characters that end a capture outright.
const SEPARATORS: &[char] = &['-', '–', '—', '|', ',', '،', '(', ')', '&', '/', ':', ';', '+', '•'];

static ENGLISH_STOP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());
static ARABIC_STOP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| ARABIC_STOP_WORDS.iter().copied().collect());

static ENGLISH_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdr\.?\s+").expect("valid title pattern"));
static ENGLISH_GLUED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdr[./]\s*").expect("valid title pattern"));
static ARABIC_DOTTED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\p{L}\p{M}])د\s*\.\s*").expect("valid title pattern"));
static ARABIC_SLASHED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\p{L}\p{M}])د\s*/\s*").expect("valid title pattern"));
static ARABIC_FULL_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\p{L}\p{M}])(?:ال)?دكتور[ةه]?[\s/.:]+").expect("valid title pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameRule {
    /// "Dr" / "Dr." then 1-3 words up to the first stop word.
    EnglishPrimary,
    /// "Dr." / "Dr/" glued to the name; only when no spaced title exists.
    EnglishFallback,
    /// د. tried before the full title.
    ArabicDotted,
    /// د/
    ArabicSlashed,
    /// دكتور / دكتورة / دكتوره / الدكتور…
    ArabicFull,
}

/// First match wins. Abbreviated Arabic forms must stay ahead of the full
/// title: a trailing credential such as "دكتورة أمراض جلدية" would otherwise
/// be matched first and clean up to nothing.
const RULE_ORDER: [NameRule; 5] = [
    NameRule::EnglishPrimary,
    NameRule::EnglishFallback,
    NameRule::ArabicDotted,
    NameRule::ArabicSlashed,
    NameRule::ArabicFull,
];

impl NameRule {
    fn apply(self, name: &str) -> Option<String> {
        let words = match self {
            NameRule::EnglishPrimary => {
                let rest = after_title(&ENGLISH_TITLE, name)?;
                strip_arabic_tail(capture_until_stop_word(rest, 3))
            }
            NameRule::EnglishFallback => {
                if ENGLISH_TITLE.is_match(name) {
                    return None;
                }
                let rest = after_title(&ENGLISH_GLUED_TITLE, name)?;
                strip_arabic_tail(leading_words(rest, 2))
            }
            NameRule::ArabicDotted => strip_arabic_tail(leading_words(after_title(&ARABIC_DOTTED_TITLE, name)?, 2)),
            NameRule::ArabicSlashed => strip_arabic_tail(leading_words(after_title(&ARABIC_SLASHED_TITLE, name)?, 2)),
            NameRule::ArabicFull => strip_arabic_tail(leading_words(after_title(&ARABIC_FULL_TITLE, name)?, 3)),
        };

        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }
}

/// Parses a personal name out of a business name. `None` means no name
/// was found, which is a normal outcome.
pub fn extract_doctor_name(name: &str) -> Option<String> {
    for rule in RULE_ORDER {
        if let Some(found) = rule.apply(name) {
            debug!("Doctor name '{}' extracted from '{}' via {:?}", found, name, rule);
            return Some(found);
        }
    }
    None
}

/// True for a word from the Arabic specialty/title stop list.
pub fn is_arabic_stop_word(word: &str) -> bool {
    ARABIC_STOP_SET.contains(fold_arabic(word).as_str())
}

fn after_title<'a>(title: &Regex, name: &'a str) -> Option<&'a str> {
    title.find(name).map(|m| &name[m.end()..])
}

/// Up to `max` tokens before the first separator, punctuation trimmed.
fn leading_words(rest: &str, max: usize) -> Vec<&str> {
    let segment = rest.split(SEPARATORS).next().unwrap_or("");
    segment
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .take(max)
        .collect()
}

fn capture_until_stop_word(rest: &str, max: usize) -> Vec<&str> {
    leading_words(rest, usize::MAX)
        .into_iter()
        .take_while(|w| {
            w.chars().any(char::is_alphabetic)
                && !ENGLISH_STOP_SET.contains(w.to_lowercase().as_str())
                && !is_arabic_stop_word(w)
        })
        .take(max)
        .collect()
}

fn strip_arabic_tail(mut words: Vec<&str>) -> Vec<&str> {
    while words.last().map_or(false, |w| is_arabic_stop_word(w)) {
        words.pop();
    }
    words
}

/// Folds hamza/alef variants, alef maqsura and teh marbuta so one stop-list
/// entry covers the spellings seen in listings.
fn fold_arabic(word: &str) -> String {
    word.chars()
        .filter(|c| !('\u{064B}'..='\u{0652}').contains(c))
        .map(|c| match c {
            'أ' | 'إ' | 'آ' => 'ا',
            'ى' => 'ي',
            'ة' => 'ه',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_primary_stops_before_specialty() {
        assert_eq!(extract_doctor_name("Dr. Ahmed Samy Dental Clinic").as_deref(), Some("Ahmed Samy"));
        assert_eq!(extract_doctor_name("Dr. Sarah Nazmy - Psychiatrist").as_deref(), Some("Sarah Nazmy"));
        assert_eq!(extract_doctor_name("dr mona & partners").as_deref(), Some("mona"));
        assert_eq!(extract_doctor_name("Dr Karim Adel and Associates").as_deref(), Some("Karim Adel"));
    }

    #[test]
    fn test_english_primary_caps_at_three_words() {
        assert_eq!(
            extract_doctor_name("Dr. Mohamed Hassan Abdelrahman Ali").as_deref(),
            Some("Mohamed Hassan Abdelrahman")
        );
    }

    #[test]
    fn test_english_fallback_for_glued_titles() {
        assert_eq!(extract_doctor_name("Dr.Mona Zaki Clinic").as_deref(), Some("Mona Zaki"));
        assert_eq!(extract_doctor_name("DR/Hany Fawzy").as_deref(), Some("Hany Fawzy"));
    }

    #[test]
    fn test_title_followed_by_specialty_has_no_name() {
        assert_eq!(extract_doctor_name("Dr. Dental Clinic"), None);
        assert_eq!(extract_doctor_name("Hayat Clinic"), None);
        assert_eq!(extract_doctor_name(""), None);
    }

    #[test]
    fn test_arabic_full_title_forms() {
        assert_eq!(extract_doctor_name("دكتورة شيماء الشبراوي").as_deref(), Some("شيماء الشبراوي"));
        assert_eq!(extract_doctor_name("عيادة الدكتورة سهام أبو حامد").as_deref(), Some("سهام أبو حامد"));
        assert_eq!(extract_doctor_name("دكتور عاطف خياط").as_deref(), Some("عاطف خياط"));
        assert_eq!(extract_doctor_name("عيادة الدكتور/ محمود سالم").as_deref(), Some("محمود سالم"));
    }

    #[test]
    fn test_arabic_abbreviated_titles() {
        assert_eq!(extract_doctor_name("د. أسامة عامر").as_deref(), Some("أسامة عامر"));
        assert_eq!(extract_doctor_name("د/ محمد حسن استشاري").as_deref(), Some("محمد حسن"));
        assert_eq!(extract_doctor_name("عيادة د.هالة").as_deref(), Some("هالة"));
    }

    #[test]
    fn test_arabic_trailing_specialty_is_stripped() {
        assert_eq!(extract_doctor_name("د. أحمد استشاري جراحة").as_deref(), Some("أحمد"));
        assert_eq!(extract_doctor_name("دكتور محمد لطب الأسنان").as_deref(), Some("محمد"));
        assert_eq!(extract_doctor_name("دكتور استشاري"), None);
    }

    #[test]
    fn test_abbreviated_title_wins_over_trailing_credential() {
        assert_eq!(
            extract_doctor_name("د. منى حسن دكتورة أمراض جلدية").as_deref(),
            Some("منى حسن")
        );
    }

    #[test]
    fn test_arabic_results_are_short_and_never_end_in_stop_word() {
        let names = [
            "دكتورة شيماء الشبراوي",
            "عيادة الدكتورة سهام أبو حامد محمود",
            "د. أحمد استشاري جراحة",
            "دكتور محمد علي حسن لطب الأسنان",
            "د/ سامي نساء وتوليد",
            "الدكتور خالد عبد الله أخصائي",
            "دكتوره نهى عيون",
            "د. منى حسن دكتورة أمراض جلدية",
            "Dr. محمد لطب الأسنان",
            "Dr. أحمد عيادة أسنان",
            "Dr.سامي جراحة",
        ];
        for name in names {
            if let Some(found) = extract_doctor_name(name) {
                let tokens: Vec<&str> = found.split(' ').collect();
                assert!(tokens.len() <= 3, "{} -> {}", name, found);
                let last = tokens.last().copied().unwrap_or("");
                assert!(!is_arabic_stop_word(last), "{} -> {}", name, found);
            }
        }
    }

    #[test]
    fn test_latin_title_with_arabic_name() {
        assert_eq!(extract_doctor_name("Dr. محمد لطب الأسنان").as_deref(), Some("محمد"));
        assert_eq!(extract_doctor_name("Dr. أحمد عيادة أسنان").as_deref(), Some("أحمد"));
        assert_eq!(extract_doctor_name("Dr. منى حسن").as_deref(), Some("منى حسن"));
        assert_eq!(extract_doctor_name("Dr.سامي جراحة").as_deref(), Some("سامي"));
        assert_eq!(extract_doctor_name("Dr. استشاري جراحة"), None);
    }

    #[test]
    fn test_diacritic_before_dot_is_not_a_title() {
        assert_eq!(extract_doctor_name("محمّد. للجلدية"), None);
        assert_eq!(extract_doctor_name("محمّد/ حسن"), None);
        assert_eq!(extract_doctor_name("عيادة د. هالة").as_deref(), Some("هالة"));
    }

    #[test]
    fn test_fold_arabic_variants() {
        assert!(is_arabic_stop_word("الأسنان"));
        assert!(is_arabic_stop_word("أستاذ"));
        assert!(is_arabic_stop_word("جراحة"));
        assert!(!is_arabic_stop_word("محمد"));
    }
}
