use serde::{Deserialize, Serialize};

/// Applicant details supplied alongside an upload. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Candidate {
    /// Phone number trimmed, with blank values treated as absent.
    pub fn phone(&self) -> Option<&str> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_phone_is_absent() {
        let candidate = Candidate {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("   ".to_string()),
        };
        assert_eq!(candidate.phone(), None);
    }

    #[test]
    fn test_phone_is_trimmed() {
        let candidate = Candidate {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some(" +1 555 0100 ".to_string()),
        };
        assert_eq!(candidate.phone(), Some("+1 555 0100"));
    }
}
