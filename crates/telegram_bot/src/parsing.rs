use engine::{Currency, Money};

/// A manually typed split: the sender paid `amount_minor` on behalf of the
/// friend nicknamed `nickname`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct QuickSplit {
    pub nickname: String,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("importo non valido")]
    InvalidAmount,
    #[error("manca il nome dell'amico")]
    MissingNickname,
    #[error("troppi tag: massimo 1")]
    TooManyTags,
    #[error("testo vuoto")]
    Empty,
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a quick-split message into a draft expense.
///
/// Rules:
/// - `@nick 12.50 ...` => the sender paid 12.50 for `nick`
/// - optional `#tag` (max 1) => category (case-insensitive)
/// - everything else becomes the note
pub(crate) fn parse_quick_split(input: &str, currency: Currency) -> Result<QuickSplit, ParseError> {
    let trimmed = collapse_whitespace(input.trim());
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let rest = trimmed.strip_prefix('@').ok_or(ParseError::MissingNickname)?;

    let mut parts = rest.splitn(3, ' ');
    let nickname = parts.next().unwrap_or("").to_string();
    if nickname.is_empty() {
        return Err(ParseError::MissingNickname);
    }

    let amount_str = parts.next().ok_or(ParseError::InvalidAmount)?;
    let tail = parts.next().unwrap_or("").trim();

    let amount = Money::parse_major(amount_str, currency).map_err(|_| ParseError::InvalidAmount)?;
    let amount_minor = amount.minor();
    if amount_minor <= 0 {
        return Err(ParseError::InvalidAmount);
    }

    let mut tag: Option<String> = None;
    let mut note_tokens: Vec<&str> = Vec::new();
    for token in tail.split_whitespace() {
        if let Some(raw) = token.strip_prefix('#') {
            if raw.is_empty() {
                note_tokens.push(token);
                continue;
            }
            if tag.is_some() {
                return Err(ParseError::TooManyTags);
            }
            tag = Some(raw.to_ascii_lowercase());
        } else {
            note_tokens.push(token);
        }
    }

    let note = collapse_whitespace(&note_tokens.join(" "));
    let note = (!note.is_empty()).then_some(note);

    Ok(QuickSplit {
        nickname,
        amount_minor,
        category: tag,
        note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nickname_and_amount() {
        let parsed = parse_quick_split("@bob 12.50 pranzo", Currency::Usd).unwrap();
        assert_eq!(parsed.nickname, "bob");
        assert_eq!(parsed.amount_minor, 1250);
        assert_eq!(parsed.note.as_deref(), Some("pranzo"));
    }

    #[test]
    fn amount_only_has_no_note() {
        let parsed = parse_quick_split("@bob 8", Currency::Usd).unwrap();
        assert_eq!(parsed.amount_minor, 800);
        assert_eq!(parsed.note, None);
    }

    #[test]
    fn tag_sets_category_and_is_removed_from_note() {
        let parsed = parse_quick_split("@bob 12.50 pizza #Food cena", Currency::Usd).unwrap();
        assert_eq!(parsed.category.as_deref(), Some("food"));
        assert_eq!(parsed.note.as_deref(), Some("pizza cena"));
    }

    #[test]
    fn rejects_more_than_one_tag() {
        let err = parse_quick_split("@bob 12.50 a #x b #y", Currency::Usd).unwrap_err();
        assert!(matches!(err, ParseError::TooManyTags));
    }

    #[test]
    fn rejects_missing_nickname() {
        let err = parse_quick_split("12.50 pranzo", Currency::Usd).unwrap_err();
        assert!(matches!(err, ParseError::MissingNickname));
    }

    #[test]
    fn rejects_zero_or_negative_amounts() {
        assert!(matches!(
            parse_quick_split("@bob 0", Currency::Usd).unwrap_err(),
            ParseError::InvalidAmount
        ));
        assert!(matches!(
            parse_quick_split("@bob -5", Currency::Usd).unwrap_err(),
            ParseError::InvalidAmount
        ));
    }

    #[test]
    fn rejects_empty_input() {
        let err = parse_quick_split("   ", Currency::Usd).unwrap_err();
        assert!(matches!(err, ParseError::Empty));
    }
}
