use serde::{Deserialize, Serialize};
use unicode_script::{Script, UnicodeScript};

/// Caller-supplied locale hint. Anything unrecognized is treated as `Auto`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
	#[default]
	Auto,
	Hindi,
	English,
}
impl Locale {
	pub fn from_hint(hint: Option<&str>) -> Self {
		let Some(hint) = hint else { return Self::Auto };
		let hint = hint.trim().to_ascii_lowercase();
		let primary = hint.split(['-', '_']).next().unwrap_or_default();

		match primary {
			"hi" | "hindi" => Self::Hindi,
			"en" | "english" => Self::English,
			_ => Self::Auto,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyLanguage {
	#[serde(rename = "hi")]
	Hindi,
	#[serde(rename = "en")]
	English,
}
impl ReplyLanguage {
	pub fn from_code(code: &str) -> Option<Self> {
		match code {
			"hi" => Some(Self::Hindi),
			"en" => Some(Self::English),
			_ => None,
		}
	}

	pub fn code(self) -> &'static str {
		match self {
			Self::Hindi => "hi",
			Self::English => "en",
		}
	}
}

/// Picks the language the reply should be written in.
///
/// An explicit hint wins. Otherwise any Devanagari means Hindi, and a Latin-only query is English
/// only when language identification is confident about it, since romanized Hindi ("kisan yojana")
/// is common and reads as noise to a detector.
pub fn apparent_language(raw: &str, hint: Locale, default: ReplyLanguage) -> ReplyLanguage {
	match hint {
		Locale::Hindi => return ReplyLanguage::Hindi,
		Locale::English => return ReplyLanguage::English,
		Locale::Auto => {},
	}

	if contains_devanagari(raw) {
		return ReplyLanguage::Hindi;
	}
	if is_confidently_english(raw) {
		return ReplyLanguage::English;
	}

	default
}

pub fn contains_devanagari(input: &str) -> bool {
	input.chars().any(|ch| ch.script() == Script::Devanagari)
}

fn is_confidently_english(input: &str) -> bool {
	let Some(info) = whatlang::detect(input) else {
		return false;
	};

	info.is_reliable() && info.lang() == whatlang::Lang::Eng
}
