use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 64;

/// Name a celebrant is introduced by in reminder messages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn parse(name: String) -> Result<DisplayName, String> {
        let name = name.trim().to_string();

        if name.is_empty() {
            return Err(String::from("display name cannot be empty"));
        }

        if name.graphemes(true).count() > MAX_GRAPHEMES {
            return Err(format!(
                "{} is longer than {} characters",
                name, MAX_GRAPHEMES
            ));
        }

        if name.chars().any(char::is_control) {
            return Err(format!("{:?} contains control characters", name));
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
