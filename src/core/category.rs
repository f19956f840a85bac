use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Expense category. The set is closed; `Other` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transportation,
    Housing,
    Utilities,
    Entertainment,
    Shopping,
    Health,
    Education,
    Travel,
    Other,
}

/// A keyword rule: any keyword appearing as a substring selects `category`.
pub struct CategoryRule {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

/// Ordered rule table. The first matching rule wins, so e.g. "gas bill"
/// lands in transportation because "gas" is checked before utilities.
pub const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Food,
        keywords: &["restaurant", "food", "dinner", "lunch", "breakfast", "coffee"],
    },
    CategoryRule {
        category: Category::Transportation,
        keywords: &["uber", "taxi", "bus", "train", "gas", "car"],
    },
    CategoryRule {
        category: Category::Housing,
        keywords: &["rent", "mortgage", "home"],
    },
    CategoryRule {
        category: Category::Utilities,
        keywords: &["electricity", "water", "bill", "internet", "phone", "gas bill"],
    },
    CategoryRule {
        category: Category::Entertainment,
        keywords: &["movie", "netflix", "spotify", "concert", "game"],
    },
    CategoryRule {
        category: Category::Shopping,
        keywords: &["amazon", "mall", "store", "buy", "purchase"],
    },
    CategoryRule {
        category: Category::Health,
        keywords: &["doctor", "medicine", "hospital", "health"],
    },
    CategoryRule {
        category: Category::Education,
        keywords: &["course", "book", "tuition", "class", "school"],
    },
    CategoryRule {
        category: Category::Travel,
        keywords: &["hotel", "flight", "vacation", "trip", "travel"],
    },
];

/// Classify an expense description locally, without the remote service.
pub fn classify(description: &str) -> Category {
    let desc = description.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| desc.contains(kw)))
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Transportation,
        Category::Housing,
        Category::Utilities,
        Category::Entertainment,
        Category::Shopping,
        Category::Health,
        Category::Education,
        Category::Travel,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transportation => "transportation",
            Category::Housing => "housing",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Education => "education",
            Category::Travel => "travel",
            Category::Other => "other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Food => "🍴",
            Category::Transportation => "🚗",
            Category::Housing => "🏠",
            Category::Utilities => "⚡",
            Category::Entertainment => "🎬",
            Category::Shopping => "🛍",
            Category::Health => "💓",
            Category::Education => "🎓",
            Category::Travel => "✈",
            Category::Other => "❔",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Food => "This looks like a food expense.",
            Category::Transportation => "This is categorized as transportation.",
            Category::Housing => "This is a housing-related expense.",
            Category::Utilities => "This falls under utilities.",
            Category::Entertainment => "This is categorized as entertainment.",
            Category::Shopping => "This appears to be a shopping expense.",
            Category::Health => "This is a health-related expense.",
            Category::Education => "This is an education expense.",
            Category::Travel => "This is a travel expense.",
            Category::Other => "This doesn't fit our standard categories.",
        }
    }

    /// Keywords that select this category in the fallback classifier.
    pub fn keywords(&self) -> &'static [&'static str] {
        RULES
            .iter()
            .find(|rule| rule.category == *self)
            .map(|rule| rule.keywords)
            .unwrap_or(&[])
    }

    /// Wrap the label in the markup stored inside chat answers.
    pub fn tag(&self) -> String {
        format!(r#"<span class="category-tag">{}</span>"#, self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == folded)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r#"category-tag">(.*?)</span>"#).expect("category tag pattern is valid")
    })
}

/// Pull the category back out of a stored answer, if it carries a tag.
pub fn category_from_answer(answer: &str) -> Option<Category> {
    tag_pattern()
        .captures(answer)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Replace category markup with the bare label for plain-text display.
pub fn strip_markup(answer: &str) -> String {
    static SPAN: OnceLock<Regex> = OnceLock::new();
    let span = SPAN.get_or_init(|| {
        Regex::new(r#"<span class="category-tag">(.*?)</span>"#)
            .expect("category span pattern is valid")
    });
    span.replace_all(answer, "$1").into_owned()
}
