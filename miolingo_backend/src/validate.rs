use super::*;
use std::env;

pub const TEXT_MAX_LENGTH: usize = 2048;
pub const SLUG_MAX_LENGTH: usize = 2048;
pub const LESSON_NAME_MAX_LENGTH: usize = 256;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;

lazy_static! {

    pub static ref LANGUAGES : Vec<String> = {
        dotenv::dotenv().ok();
        parse_languages(&env::var("MIOLINGO_LANGUAGES")
            .unwrap_or_else(|_| "de,en,es,fr,it,pt".into()))
    };
}

pub fn parse_languages(list: &str) -> Vec<String> {
    list.split(',')
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn lang(field: &str, lang: &str) -> Result<()> {
    lang_in(field, lang, &LANGUAGES)
}

pub fn lang_in(field: &str, lang: &str, languages: &[String]) -> Result<()> {
    if languages.iter().any(|l| l == lang) {
        Ok(())
    } else {
        invalid(field, format!("\"{}\" is not a valid choice.", lang))
    }
}

pub fn required_text(field: &str, text: &str, max_length: usize) -> Result<()> {
    if text.trim().is_empty() {
        return invalid(field, "This field may not be blank.");
    }
    max_len(field, text, max_length)
}

pub fn max_len(field: &str, text: &str, max_length: usize) -> Result<()> {
    if text.chars().count() > max_length {
        return invalid(field,
                       format!("Ensure this field has no more than {} characters.", max_length));
    }
    Ok(())
}

/// Priorities are stored as non-negative smallints.
pub fn priority(field: &str, value: i32) -> Result<i16> {
    if value < 0 {
        return invalid(field, "Ensure this value is greater than or equal to 0.");
    }
    if value > i16::max_value() as i32 {
        return invalid(field,
                       format!("Ensure this value is less than or equal to {}.", i16::max_value()));
    }
    Ok(value as i16)
}

pub fn email(field: &str, email: &str) -> Result<()> {
    if email.is_empty() {
        return Ok(());
    }
    max_len(field, email, EMAIL_MAX_LENGTH)?;
    let mut parts = email.splitn(2, '@');
    match (parts.next(), parts.next()) {
        (Some(local), Some(domain)) if !local.is_empty() && domain.contains('.') &&
                                       !domain.starts_with('.') &&
                                       !domain.ends_with('.') => Ok(()),
        _ => invalid(field, "Enter a valid email address."),
    }
}

/// Validates a translation's text and returns its slug.
pub fn translation_text(field: &str, text: &str) -> Result<String> {
    required_text(field, text, TEXT_MAX_LENGTH)?;
    let slug = slug::slugify(text);
    if slug.is_empty() {
        return invalid(field, "Enter a text containing at least one letter or number.");
    }
    // Decomposition can make the slug longer than the text.
    if slug.chars().count() > SLUG_MAX_LENGTH {
        return invalid(field,
                       format!("Ensure this field has no more than {} characters once normalized.",
                               SLUG_MAX_LENGTH));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs() -> Vec<String> {
        parse_languages("en, FR,es,,")
    }

    #[test]
    fn language_list_is_normalized() {
        assert_eq!(langs(), vec!["en", "fr", "es"]);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(lang_in("lang", "fr", &langs()).is_ok());
        let err = lang_in("lang", "xx", &langs()).unwrap_err();
        assert_eq!(err.field(), Some("lang"));
        assert_eq!(err.field_message(), "\"xx\" is not a valid choice.");
    }

    #[test]
    fn priority_must_fit_a_positive_smallint() {
        assert_eq!(priority("priority", 0).unwrap(), 0);
        assert_eq!(priority("priority", 32767).unwrap(), 32767);
        assert!(priority("priority", -1).is_err());
        assert!(priority("priority", 32768).is_err());
    }

    #[test]
    fn text_is_required_and_bounded() {
        assert!(required_text("text", "   ", 10).is_err());
        assert!(required_text("text", "éééééééééé", 10).is_ok());
        assert!(required_text("text", "ééééééééééé", 10).is_err());
    }

    #[test]
    fn translation_text_yields_slug() {
        assert_eq!(translation_text("text", "Buenos días").unwrap(), "buenos-dias");
        let err = translation_text("text", "?!").unwrap_err();
        assert_eq!(err.field(), Some("text"));
        let long = "a".repeat(TEXT_MAX_LENGTH + 1);
        assert!(translation_text("text", &long).is_err());
    }

    #[test]
    fn ligatures_can_not_overflow_the_slug() {
        let ligatures = "\u{FB03}".repeat(1000);
        assert!(required_text("text", &ligatures, TEXT_MAX_LENGTH).is_ok());
        let err = translation_text("text", &ligatures).unwrap_err();
        assert_eq!(err.field(), Some("text"));
        assert!(err.is_validation());

        let fits = "\u{FB03}".repeat(SLUG_MAX_LENGTH / 3);
        assert_eq!(translation_text("text", &fits).unwrap().len(), SLUG_MAX_LENGTH / 3 * 3);
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "").is_ok());
        assert!(email("email", "foo@example.com").is_ok());
        assert!(email("email", "foo.example.com").is_err());
        assert!(email("email", "@example.com").is_err());
        assert!(email("email", "foo@localhost").is_err());
    }
}
