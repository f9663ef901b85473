use crate::error::{Error, Result};

/// Class letters used by the school (Cyrillic).
pub const LEVEL_LETTERS: [&str; 8] = ["А", "Б", "В", "Г", "Д", "Е", "Ж", "З"];

pub fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 {
        return Err(Error::Validation(
            "Username must be at least 3 characters".to_string(),
        ));
    }
    if username.len() > 30 {
        return Err(Error::Validation(
            "Username is too long (30 characters max)".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Validation(
            "Username may only contain letters, digits, underscores and dashes".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(Error::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if password.len() > 128 {
        return Err(Error::Validation(
            "Password is too long (128 characters max)".to_string(),
        ));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;
    for c in password.chars() {
        if c.is_uppercase() {
            has_upper = true;
        } else if c.is_lowercase() {
            has_lower = true;
        } else if c.is_numeric() {
            has_digit = true;
        } else if !c.is_whitespace() {
            has_special = true;
        }
    }

    if !has_upper {
        return Err(Error::Validation(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    if !has_lower {
        return Err(Error::Validation(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }
    if !has_digit {
        return Err(Error::Validation(
            "Password must contain at least one digit".to_string(),
        ));
    }
    if !has_special {
        return Err(Error::Validation(
            "Password must contain at least one special character".to_string(),
        ));
    }
    Ok(())
}

/// Email is optional; an empty string passes.
pub fn validate_email(email: &str) -> bool {
    if email.is_empty() {
        return true;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn validate_level(level: i32) -> Result<()> {
    if !(1..=11).contains(&level) {
        return Err(Error::Validation(
            "Class level must be between 1 and 11".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_level_letter(letter: &str) -> Result<()> {
    if LEVEL_LETTERS.contains(&letter) {
        Ok(())
    } else {
        Err(Error::Validation("Invalid class letter".to_string()))
    }
}

/// Normalizes a letter coming from a query/profile payload: trimmed and
/// uppercased. Returns None when the result is not a single character.
pub fn normalize_level_letter(raw: &str) -> Option<String> {
    let letter: String = raw.trim().to_uppercase();
    if letter.chars().count() == 1 {
        Some(letter)
    } else {
        None
    }
}

/// Strips NUL and control characters (tabs and newlines survive), trims.
pub fn sanitize_string(s: &str) -> String {
    s.chars()
        .filter(|&c| c as u32 >= 32 || c == '\t' || c == '\n' || c == '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("anna_2014").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn password_needs_all_character_classes() {
        assert!(validate_password("Secret#123").is_ok());
        assert!(validate_password("secret#123").is_err());
        assert!(validate_password("SECRET#123").is_err());
        assert!(validate_password("Secret#abc").is_err());
        assert!(validate_password("Secret1234").is_err());
        assert!(validate_password("S#1a").is_err());
    }

    #[test]
    fn email_accepts_empty_and_plain_addresses() {
        assert!(validate_email(""));
        assert!(validate_email("kid@example.com"));
        assert!(validate_email("first.last+tag@mail.example.org"));
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("kid@nodot"));
        assert!(!validate_email("kid@host.1x"));
    }

    #[test]
    fn level_letter_is_cyrillic_set() {
        assert!(validate_level_letter("А").is_ok());
        assert!(validate_level_letter("Z").is_err());
        assert_eq!(normalize_level_letter(" а "), Some("А".to_string()));
        assert_eq!(normalize_level_letter("АБ"), None);
    }

    #[test]
    fn sanitize_drops_control_chars() {
        assert_eq!(sanitize_string("  Аня\u{0}\u{7} Петрова "), "Аня Петрова");
    }
}
