//! Skill detection strategies and experience extraction over plain résumé text.

/// Decides which of a job's skills appear in a résumé.
/// Returned names keep the job's spelling so they can be compared against its lists.
pub trait SkillMatcher: Send + Sync {
    fn detect(&self, resume_text: &str, skills: &[String]) -> Vec<String>;
}

/// Case-insensitive match that requires a non-alphanumeric character (or text
/// boundary) on both sides, so "Go" is found in "Go, SQL" but not in "good".
pub struct WholeWordMatcher;

impl SkillMatcher for WholeWordMatcher {
    fn detect(&self, resume_text: &str, skills: &[String]) -> Vec<String> {
        let haystack = resume_text.to_lowercase();
        skills
            .iter()
            .filter(|skill| contains_word(&haystack, skill))
            .cloned()
            .collect()
    }
}

/// Plain case-insensitive substring match. Cheaper and looser than [`WholeWordMatcher`].
pub struct SubstringMatcher;

impl SkillMatcher for SubstringMatcher {
    fn detect(&self, resume_text: &str, skills: &[String]) -> Vec<String> {
        let haystack = resume_text.to_lowercase();
        skills
            .iter()
            .filter(|skill| {
                let needle = skill.trim().to_lowercase();
                !needle.is_empty() && haystack.contains(&needle)
            })
            .cloned()
            .collect()
    }
}

/// `haystack` must already be lowercased.
fn contains_word(haystack: &str, skill: &str) -> bool {
    let needle = skill.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(&needle).any(|(idx, found)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + found.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Anything larger is a year or a typo, not a career length.
const MAX_PLAUSIBLE_YEARS: u32 = 60;

/// Largest "N years" / "N+ years" / "N-year" / "N yrs" figure in the text, or 0.
pub fn detect_experience_years(text: &str) -> u32 {
    let lower = text.to_lowercase();
    let bytes = lower.as_bytes();
    let mut best = 0;
    let mut i = 0;

    while i < bytes.len() {
        let starts_number =
            bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_alphanumeric());
        if !starts_number {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let Ok(value) = lower[start..i].parse::<u32>() else {
            continue;
        };

        let mut j = i;
        if j < bytes.len() && bytes[j] == b'+' {
            j += 1;
        }
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'-') {
            j += 1;
        }

        let rest = &lower[j..];
        if (rest.starts_with("year") || rest.starts_with("yr")) && value <= MAX_PLAUSIBLE_YEARS {
            best = best.max(value);
        }
    }

    best
}
