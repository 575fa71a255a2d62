//! Text normalization pipeline.
//!
//! Folds raw tokens into a canonical learning/query form: Unicode
//! decomposition, diacritic/punctuation stripping, recomposition,
//! lowercasing, stemming delegation, and an optional run-length squish.
//! Normalizing before stemming maximizes stem collision for
//! near-duplicate tokens.

mod squish;
mod stem;

pub use squish::squish;
pub use stem::{Identity, Snowball, Stem};

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Repeat cap used by the production squish configuration.
const SQUISH_MAX_RUN: usize = 2;

/// Where (and whether) the run-length squish runs relative to stemming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquishMode {
    Off,
    BeforeStem(usize),
    AfterStem(usize),
}

/// Folds a raw token into its canonical form.
///
/// Every step is total: malformed input degrades to a shorter (possibly
/// empty) token rather than erroring.
pub struct Normalizer<S> {
    stem: S,
    squish: SquishMode,
}

impl<S: Stem> Normalizer<S> {
    /// Production configuration: squish after stemming, capped at 2.
    pub fn new(stem: S) -> Self {
        Self {
            stem,
            squish: SquishMode::AfterStem(SQUISH_MAX_RUN),
        }
    }

    pub fn with_squish(mut self, squish: SquishMode) -> Self {
        self.squish = squish;
        self
    }

    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold(raw);
        match self.squish {
            SquishMode::Off => self.stem.stem(&folded),
            SquishMode::BeforeStem(cap) => self.stem.stem(&squish(&folded, cap)),
            SquishMode::AfterStem(cap) => squish(&self.stem.stem(&folded), cap),
        }
    }
}

/// NFD, drop combining marks and punctuation, NFC, lowercase.
fn fold(raw: &str) -> String {
    raw.nfd()
        .filter(|&ch| !is_combining_mark(ch) && !is_punctuation(ch))
        .nfc()
        .collect::<String>()
        .to_lowercase()
}

fn is_punctuation(ch: char) -> bool {
    ch.general_category_group() == GeneralCategoryGroup::Punctuation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Normalizer<Identity> {
        Normalizer::new(Identity).with_squish(SquishMode::Off)
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(identity().normalize("café"), "cafe");
        assert_eq!(identity().normalize("naïve"), "naive");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(identity().normalize("don't!"), "dont");
        assert_eq!(identity().normalize("«hello»"), "hello");
    }

    #[test]
    fn lowercases_after_folding() {
        assert_eq!(identity().normalize("CAFÉ"), "cafe");
    }

    #[test]
    fn punctuation_only_token_folds_to_empty() {
        assert_eq!(identity().normalize("?!..."), "");
    }

    #[test]
    fn idempotent_on_canonical_input() {
        let norm = identity();
        let once = norm.normalize("already canonical");
        assert_eq!(norm.normalize(&once), once);

        let squishing = Normalizer::new(Identity);
        let once = squishing.normalize("soooo");
        assert_eq!(once, "soo");
        assert_eq!(squishing.normalize(&once), once);
    }

    #[test]
    fn squish_after_stem_caps_runs() {
        let norm = Normalizer::new(Identity);
        assert_eq!(norm.normalize("Soooo"), "soo");
    }

    #[test]
    fn squish_before_stem_feeds_collapsed_token_to_stemmer() {
        let norm = Normalizer::new(Snowball::english()).with_squish(SquishMode::BeforeStem(1));
        // "jumpiiing" -> squish(1) -> "jumping" -> stem -> "jump"
        assert_eq!(norm.normalize("jumpiiing"), "jump");
    }

    #[test]
    fn full_pipeline_with_snowball() {
        let norm = Normalizer::new(Snowball::english());
        assert_eq!(norm.normalize("Jumping!"), "jump");
        assert_eq!(norm.normalize("jumping"), "jump");
    }
}
