// Category value object
// Small open tag set; unknown tags are kept verbatim (lowercased)

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Event,
    Deadline,
    Meeting,
    Announcement,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Event => "event",
            Category::Deadline => "deadline",
            Category::Meeting => "meeting",
            Category::Announcement => "announcement",
            Category::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "event" => Category::Event,
            "deadline" => Category::Deadline,
            "meeting" => Category::Meeting,
            "announcement" => Category::Announcement,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from(s.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
