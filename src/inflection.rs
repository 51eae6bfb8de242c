//! English inflection for route names: "author" <-> "authors", "category" <-> "categories".

use heck::ToUpperCamelCase;

const UNCOUNTABLE: &[&str] = &[
    "equipment", "information", "rice", "money", "species", "series", "fish", "sheep", "deer", "news", "data",
    "metadata",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Pluralize a lower-case identifier. Already-plural words are returned unchanged.
/// e.g. "author" -> "authors", "category" -> "categories", "box" -> "boxes"
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return lower;
    }
    for (singular, plural) in IRREGULAR {
        if lower == *plural {
            return lower;
        }
        if lower == *singular {
            return (*plural).to_string();
        }
    }
    if singularize(&lower) != lower {
        return lower;
    }
    let chars: Vec<char> = lower.chars().collect();
    let last = chars[chars.len() - 1];
    let before_last = if chars.len() > 1 { Some(chars[chars.len() - 2]) } else { None };

    if last == 'y' && before_last.map(|c| !is_vowel(c)).unwrap_or(false) {
        return format!("{}ies", &lower[..lower.len() - 1]);
    }
    if lower.ends_with("fe") {
        return format!("{}ves", &lower[..lower.len() - 2]);
    }
    if lower.ends_with("lf") || lower.ends_with("af") {
        return format!("{}ves", &lower[..lower.len() - 1]);
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{}es", lower);
    }
    format!("{}s", lower)
}

/// Singularize a lower-case identifier. Already-singular words are returned unchanged.
/// e.g. "authors" -> "author", "categories" -> "category", "boxes" -> "box"
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return lower;
    }
    for (singular, plural) in IRREGULAR {
        if lower == *singular {
            return lower;
        }
        if lower == *plural {
            return (*singular).to_string();
        }
    }
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &lower[..lower.len() - 3]);
    }
    if lower.len() > 3 && lower.ends_with("ves") {
        let stem = &lower[..lower.len() - 3];
        return if stem.ends_with('l') || stem.ends_with('a') {
            format!("{}f", stem)
        } else {
            format!("{}fe", stem)
        };
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return lower;
    }
    if lower.len() > 1 && lower.ends_with('s') {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

/// "books" -> "Books", "author_profiles" -> "AuthorProfiles". Used for default setter names.
pub fn to_pascal_case(s: &str) -> String {
    s.to_upper_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_regular_and_irregular_words() {
        assert_eq!(pluralize("author"), "authors");
        assert_eq!(pluralize("Authors"), "authors");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("people"), "people");
        assert_eq!(pluralize("news"), "news");
    }

    #[test]
    fn singularizes_regular_and_irregular_words() {
        assert_eq!(singularize("authors"), "author");
        assert_eq!(singularize("author"), "author");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("shelves"), "shelf");
    }

    #[test]
    fn pascal_case_for_setters() {
        assert_eq!(format!("set{}", to_pascal_case("books")), "setBooks");
        assert_eq!(to_pascal_case("author_profiles"), "AuthorProfiles");
        assert_eq!(to_pascal_case("cover-art"), "CoverArt");
    }
}
