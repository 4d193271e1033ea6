use super::domain::{EducationLevel, LanguageTest, MaritalStatus, OfficialLanguage};

/// Canonical lookup key: case-folded, punctuation-light, whitespace collapsed.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|ch| !matches!(ch, '\u{feff}' | '\u{200b}' | '\'' | '\u{2019}' | '.'))
        .map(|ch| match ch {
            '_' | '-' | '/' => ' ',
            other => other,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

fn lookup<T: Copy>(table: &[(&str, T)], raw: &str) -> Option<T> {
    let key = normalize_label(raw);
    if key.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, value)| *value)
}

const EDUCATION_LABELS: &[(&str, EducationLevel)] = &[
    ("less than secondary", EducationLevel::LessThanSecondary),
    ("none", EducationLevel::LessThanSecondary),
    ("no credential", EducationLevel::LessThanSecondary),
    ("primary", EducationLevel::LessThanSecondary),
    ("secondary", EducationLevel::Secondary),
    ("secondary school", EducationLevel::Secondary),
    ("high school", EducationLevel::Secondary),
    ("high school diploma", EducationLevel::Secondary),
    ("one or two year diploma", EducationLevel::OneOrTwoYearDiploma),
    ("one two year diploma", EducationLevel::OneOrTwoYearDiploma),
    ("one year diploma", EducationLevel::OneOrTwoYearDiploma),
    ("two year diploma", EducationLevel::OneOrTwoYearDiploma),
    ("1 year diploma", EducationLevel::OneOrTwoYearDiploma),
    ("2 year diploma", EducationLevel::OneOrTwoYearDiploma),
    ("diploma", EducationLevel::OneOrTwoYearDiploma),
    ("certificate", EducationLevel::OneOrTwoYearDiploma),
    ("college diploma", EducationLevel::OneOrTwoYearDiploma),
    ("bachelors", EducationLevel::Bachelors),
    ("bachelor", EducationLevel::Bachelors),
    ("bachelors degree", EducationLevel::Bachelors),
    ("bachelor degree", EducationLevel::Bachelors),
    ("three year degree", EducationLevel::Bachelors),
    ("3 year degree", EducationLevel::Bachelors),
    ("undergraduate degree", EducationLevel::Bachelors),
    ("two or more credentials", EducationLevel::TwoOrMoreCredentials),
    ("two or more", EducationLevel::TwoOrMoreCredentials),
    ("masters", EducationLevel::Masters),
    ("master", EducationLevel::Masters),
    ("masters degree", EducationLevel::Masters),
    ("master degree", EducationLevel::Masters),
    ("professional degree", EducationLevel::Masters),
    ("phd", EducationLevel::Phd),
    ("doctorate", EducationLevel::Phd),
    ("doctoral degree", EducationLevel::Phd),
];

const MARITAL_LABELS: &[(&str, MaritalStatus)] = &[
    ("single", MaritalStatus::Single),
    ("never married", MaritalStatus::Single),
    ("divorced", MaritalStatus::Single),
    ("widowed", MaritalStatus::Single),
    ("separated", MaritalStatus::Single),
    ("annulled", MaritalStatus::Single),
    ("annulled marriage", MaritalStatus::Single),
    ("married", MaritalStatus::Married),
    ("common law", MaritalStatus::CommonLaw),
    ("common law partner", MaritalStatus::CommonLaw),
];

const LANGUAGE_TEST_LABELS: &[(&str, LanguageTest)] = &[
    ("ielts", LanguageTest::Ielts),
    ("ielts general", LanguageTest::Ielts),
    ("ielts general training", LanguageTest::Ielts),
    ("celpip", LanguageTest::Celpip),
    ("celpip g", LanguageTest::Celpip),
    ("celpip general", LanguageTest::Celpip),
    ("pte", LanguageTest::PteCore),
    ("pte core", LanguageTest::PteCore),
    ("tef", LanguageTest::TefCanada),
    ("tef canada", LanguageTest::TefCanada),
    ("tcf", LanguageTest::TcfCanada),
    ("tcf canada", LanguageTest::TcfCanada),
];

const OFFICIAL_LANGUAGE_LABELS: &[(&str, OfficialLanguage)] = &[
    ("english", OfficialLanguage::English),
    ("en", OfficialLanguage::English),
    ("french", OfficialLanguage::French),
    ("fr", OfficialLanguage::French),
    ("francais", OfficialLanguage::French),
];

const TRUE_LABELS: &[(&str, bool)] = &[
    ("true", true),
    ("yes", true),
    ("y", true),
    ("1", true),
    ("false", false),
    ("no", false),
    ("n", false),
    ("0", false),
];

pub(crate) fn education_level(raw: &str) -> Option<EducationLevel> {
    lookup(EDUCATION_LABELS, raw)
}

pub(crate) fn marital_status(raw: &str) -> Option<MaritalStatus> {
    lookup(MARITAL_LABELS, raw)
}

pub(crate) fn language_test(raw: &str) -> Option<LanguageTest> {
    lookup(LANGUAGE_TEST_LABELS, raw)
}

pub(crate) fn official_language(raw: &str) -> Option<OfficialLanguage> {
    lookup(OFFICIAL_LANGUAGE_LABELS, raw)
}

pub(crate) fn flag(raw: &str) -> Option<bool> {
    lookup(TRUE_LABELS, raw)
}

/// Country strings that count as Canadian work or study.
pub(crate) fn is_canada(raw: &str) -> bool {
    matches!(normalize_label(raw).as_str(), "canada" | "ca" | "can")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_case_and_separators() {
        assert_eq!(normalize_label("  Two_Or-More   Credentials "), "two or more credentials");
        assert_eq!(normalize_label("Master's\u{200b} Degree"), "masters degree");
        assert_eq!(normalize_label("Ph.D."), "phd");
    }

    #[test]
    fn resolves_education_labels() {
        assert_eq!(education_level("PhD"), Some(EducationLevel::Phd));
        assert_eq!(education_level("Bachelor's degree"), Some(EducationLevel::Bachelors));
        assert_eq!(
            education_level("one_two_year_diploma"),
            Some(EducationLevel::OneOrTwoYearDiploma)
        );
        assert_eq!(education_level("trade apprenticeship"), None);
        assert_eq!(education_level("   "), None);
    }

    #[test]
    fn resolves_marital_and_test_labels() {
        assert_eq!(marital_status("Common-Law"), Some(MaritalStatus::CommonLaw));
        assert_eq!(marital_status("DIVORCED"), Some(MaritalStatus::Single));
        assert_eq!(language_test("CELPIP-G"), Some(LanguageTest::Celpip));
        assert_eq!(language_test("tef_canada"), Some(LanguageTest::TefCanada));
        assert_eq!(official_language("klingon"), None);
        assert_eq!(official_language("French"), Some(OfficialLanguage::French));
    }

    #[test]
    fn recognizes_canada() {
        assert!(is_canada(" Canada "));
        assert!(!is_canada("India"));
    }
}
