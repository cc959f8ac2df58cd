//! Probability extraction from free-text forecasts.
//!
//! Forecaster output is natural language with the numeric estimate
//! embedded somewhere in it. Extraction is order-sensitive: a labelled
//! `likelihood` value outranks a bare percentage, which outranks a bare
//! decimal, which outranks the fallback. Unparsable text is never an
//! error — it maps to maximal uncertainty.

/// Returned when no probability can be found in the text.
pub const DEFAULT_PROBABILITY: f64 = 50.0;

/// Extract a probability percentage in [0, 100] from arbitrary text.
///
/// Rules, first match wins:
/// 1. number following the word "likelihood" (emphasis punctuation and
///    a trailing `%` are tolerated); values <= 1.0 are fractions;
/// 2. any standalone number immediately followed by `%`;
/// 3. any standalone decimal strictly between 0 and 1, times 100;
/// 4. `DEFAULT_PROBABILITY`.
pub fn extract_probability(text: &str) -> f64 {
    if let Some(p) = labelled_likelihood(text) {
        return p.clamp(0.0, 100.0);
    }
    let tokens = scan_numbers(text);
    if let Some(t) = tokens.iter().find(|t| t.percent) {
        return t.value.clamp(0.0, 100.0);
    }
    if let Some(t) = tokens
        .iter()
        .find(|t| t.has_dot && t.value > 0.0 && t.value < 1.0)
    {
        return (t.value * 100.0).clamp(0.0, 100.0);
    }
    DEFAULT_PROBABILITY
}

/// A number found in the text, with enough context to classify it.
struct NumToken {
    value: f64,
    /// Token contained a decimal point.
    has_dot: bool,
    /// Token was immediately followed by '%'.
    percent: bool,
}

/// Punctuation tolerated between the "likelihood" label and its number:
/// markdown emphasis, quoting, and separators.
fn is_emphasis(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '*' | '_' | '`' | '\'' | '"' | '(' | '~' | '=' | '-')
}

/// Rule 1: a number directly after the word "likelihood".
fn labelled_likelihood(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    for (pos, _) in lower.match_indices("likelihood") {
        let after = &lower[pos + "likelihood".len()..];
        let after = after.trim_start_matches(is_emphasis);

        let token: String = after
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if token.is_empty() {
            continue;
        }
        if let Ok(value) = token.trim_end_matches('.').parse::<f64>() {
            // <= 1.0 means the forecaster wrote a fraction, not a percentage.
            return Some(if value <= 1.0 { value * 100.0 } else { value });
        }
    }
    None
}

/// Scan for standalone numbers: digit runs not preceded by an
/// alphanumeric character, so "v2" or "gpt-4o" never count.
fn scan_numbers(text: &str) -> Vec<NumToken> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        let standalone = !prev.map_or(false, |p| p.is_alphanumeric() || p == '.');
        if c.is_ascii_digit() && standalone {
            let mut token = String::new();
            token.push(c);
            while let Some(&n) = chars.peek() {
                if n.is_ascii_digit() || n == '.' {
                    token.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            let percent = chars.peek() == Some(&'%');
            if let Ok(value) = token.trim_end_matches('.').parse::<f64>() {
                out.push(NumToken {
                    value,
                    has_dot: token.contains('.'),
                    percent,
                });
            }
            prev = token.chars().last();
        } else {
            prev = Some(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_fraction() {
        assert_eq!(extract_probability("I estimate the likelihood 0.73 here."), 73.0);
    }

    #[test]
    fn test_labelled_percentage() {
        assert_eq!(extract_probability("likelihood 42%"), 42.0);
    }

    #[test]
    fn test_labelled_with_emphasis() {
        assert_eq!(extract_probability("My final answer: likelihood: `0.40`"), 40.0);
        assert_eq!(extract_probability("**Likelihood** *0.25*"), 25.0);
    }

    #[test]
    fn test_labelled_outranks_bare_percentage() {
        // The 80% appears first but the labelled value wins.
        let text = "The market sits at 80% but I put the likelihood 0.30.";
        assert_eq!(extract_probability(text), 30.0);
    }

    #[test]
    fn test_bare_percentage() {
        assert_eq!(extract_probability("Roughly 17% chance of this resolving YES."), 17.0);
    }

    #[test]
    fn test_bare_percentage_outranks_decimal() {
        let text = "confidence 0.9, but the real number is 35%";
        assert_eq!(extract_probability(text), 35.0);
    }

    #[test]
    fn test_bare_decimal() {
        assert_eq!(extract_probability("My estimate is 0.64 given the data."), 64.0);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(extract_probability("I cannot put a number on this."), 50.0);
        assert_eq!(extract_probability(""), 50.0);
    }

    #[test]
    fn test_integer_without_percent_falls_through() {
        // "3 reasons" is neither a percentage nor a decimal in (0,1).
        assert_eq!(extract_probability("There are 3 reasons to doubt this."), 50.0);
    }

    #[test]
    fn test_number_glued_to_word_not_standalone() {
        assert_eq!(extract_probability("model gpt4o says nothing numeric"), 50.0);
    }

    #[test]
    fn test_clamped_to_range() {
        assert_eq!(extract_probability("likelihood 250"), 100.0);
    }

    #[test]
    fn test_idempotent() {
        let text = "likelihood 0.73";
        let a = extract_probability(text);
        let b = extract_probability(text);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_label_with_no_number_falls_through() {
        // Label present but no adjacent number: rule 3 catches the 0.6.
        assert_eq!(extract_probability("The likelihood is hard to say, maybe 0.6"), 60.0);
    }
}
