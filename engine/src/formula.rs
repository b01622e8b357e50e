//! Damage and healing formulas: `+`-joined dice groups and constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Dice;

/// Dice per term beyond which a term is rejected as malformed.
pub const MAX_DICE_PER_TERM: u32 = 100;
/// Largest die a term may name.
pub const MAX_SIDES: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Dice { count: u32, sides: u32 },
    Flat(i32),
    Malformed(String),
}

impl Term {
    fn parse(raw: &str) -> Term {
        let lowered = raw.to_lowercase();
        if let Some((count, sides)) = lowered.split_once('d') {
            let count = if count.is_empty() {
                Some(1)
            } else {
                count.parse::<u32>().ok()
            };
            return match (count, sides.parse::<u32>().ok()) {
                (Some(count), Some(sides))
                    if (1..=MAX_DICE_PER_TERM).contains(&count)
                        && (1..=MAX_SIDES).contains(&sides) =>
                {
                    Term::Dice { count, sides }
                }
                _ => Term::Malformed(raw.to_string()),
            };
        }
        match lowered.parse::<i32>() {
            Ok(value) => Term::Flat(value),
            Err(_) => Term::Malformed(raw.to_string()),
        }
    }
}

/// A parsed formula. Parsing never fails; unusable terms are kept as
/// [`Term::Malformed`] and contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Formula {
    source: String,
    terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRoll {
    pub total: i32,
    pub faces: Vec<u32>,
    pub malformed: bool,
}

impl Formula {
    pub fn parse(source: &str) -> Self {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        let terms = compact.split('+').map(Term::parse).collect();
        Self {
            source: source.to_string(),
            terms,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True when not a single term could be parsed.
    pub fn is_malformed(&self) -> bool {
        self.terms.iter().all(|t| matches!(t, Term::Malformed(_)))
    }

    pub fn malformed_terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::Malformed(raw) => Some(raw.as_str()),
            _ => None,
        })
    }

    /// Inclusive (min, max) of the total, saturated into `i32`.
    pub fn bounds(&self) -> (i32, i32) {
        let (lo, hi) = self.terms.iter().fold((0i64, 0i64), |(lo, hi), term| match *term {
            Term::Dice { count, sides } => (
                lo.saturating_add(count as i64),
                hi.saturating_add(count as i64 * sides as i64),
            ),
            Term::Flat(v) => (lo.saturating_add(v as i64), hi.saturating_add(v as i64)),
            Term::Malformed(_) => (lo, hi),
        });
        (saturate(lo), saturate(hi))
    }

    pub fn evaluate(&self, dice: &mut Dice) -> FormulaRoll {
        let mut total = 0i64;
        let mut faces = Vec::new();
        for term in &self.terms {
            match *term {
                Term::Dice { count, sides } => {
                    for _ in 0..count {
                        let face = dice.roll(sides);
                        faces.push(face);
                        total = total.saturating_add(face as i64);
                    }
                }
                Term::Flat(v) => total = total.saturating_add(v as i64),
                Term::Malformed(_) => {}
            }
        }
        FormulaRoll {
            total: saturate(total),
            faces,
            malformed: self.is_malformed(),
        }
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Parse and evaluate in one step.
pub fn evaluate(source: &str, dice: &mut Dice) -> FormulaRoll {
    Formula::parse(source).evaluate(dice)
}

impl From<String> for Formula {
    fn from(source: String) -> Self {
        Formula::parse(&source)
    }
}

impl From<&str> for Formula {
    fn from(source: &str) -> Self {
        Formula::parse(source)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_terms() {
        let f = Formula::parse(" 2D6 + 3 + d8 ");
        assert_eq!(
            f.terms(),
            &[
                Term::Dice { count: 2, sides: 6 },
                Term::Flat(3),
                Term::Dice { count: 1, sides: 8 },
            ]
        );
        assert_eq!(f.bounds(), (6, 23));
    }

    #[test]
    fn malformed_terms_contribute_nothing() {
        let f = Formula::parse("1d4+fire+2");
        assert!(!f.is_malformed());
        assert_eq!(f.malformed_terms().collect::<Vec<_>>(), vec!["fire"]);
        let mut dice = Dice::from_scripted(vec![3]);
        assert_eq!(f.evaluate(&mut dice).total, 5);
    }

    #[test]
    fn nothing_parsable_is_malformed() {
        for src in ["", "special", "xdy", "0d6", "1d0", "500d6", "1d1001"] {
            assert!(Formula::parse(src).is_malformed(), "{src:?}");
        }
    }
}
