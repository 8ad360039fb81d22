use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use regex::Regex;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").expect("<- that is a valid regex there");
}

/// Turns free text into the normalized key used for translation dedup:
/// accents stripped, lowercased, every non-alphanumeric run collapsed into a
/// single `-`, no leading or trailing `-`.
pub fn slugify(text: &str) -> String {
    let ascii: String = text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();

    NON_ALNUM.replace_all(&ascii, "-").trim_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_strips_accents() {
        assert_eq!(slugify("Bonjour"), "bonjour");
        assert_eq!(slugify("Éléphant"), "elephant");
        assert_eq!(slugify("mañana"), "manana");
        assert_eq!(slugify("Straße"), "strae");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  ¿Qué tal?  "), "que-tal");
        assert_eq!(slugify("l'homme -- la femme"), "l-homme-la-femme");
        assert_eq!(slugify("snake_case_word"), "snake-case-word");
        assert_eq!(slugify("ﬁn"), "fin");
    }

    #[test]
    fn is_deterministic_and_idempotent() {
        let once = slugify("Ça va, très bien !");
        assert_eq!(once, "ca-va-tres-bien");
        assert_eq!(slugify(&once), once);
        assert_eq!(slugify("Ça va, très bien !"), once);
    }

    #[test]
    fn non_latin_text_collapses_to_empty() {
        assert_eq!(slugify("こんにちは"), "");
        assert_eq!(slugify("---"), "");
    }
}
