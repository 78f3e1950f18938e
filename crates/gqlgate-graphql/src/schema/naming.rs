//! Derivation of GraphQL names from path templates and model names.

/// Derives the query field name for a path template.
///
/// The first non-empty segment is used verbatim; each later `{param}` segment
/// contributes `By` + the capitalized parameter name and each later literal
/// segment contributes `With` + the capitalized literal.
///
/// ```
/// use gqlgate_graphql::schema::derive_field_name;
///
/// assert_eq!(derive_field_name("/books"), "books");
/// assert_eq!(derive_field_name("/books/{id}"), "booksById");
/// assert_eq!(derive_field_name("/books/library/{id}"), "booksWithLibraryById");
/// ```
pub fn derive_field_name(path_template: &str) -> String {
    let mut segments = path_template.split('/').filter(|s| !s.is_empty());

    let Some(first) = segments.next() else {
        return String::new();
    };

    let mut name = first.to_string();
    for segment in segments {
        match segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            Some(parameter) => {
                name.push_str("By");
                name.push_str(&capitalize(parameter));
            }
            None => {
                name.push_str("With");
                name.push_str(&capitalize(segment));
            }
        }
    }
    name
}

/// Upper-cases the first character, leaving the rest unchanged.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Returns `true` if `name` matches `[_A-Za-z][_0-9A-Za-z]*` and is not
/// reserved for introspection (`__` prefix).
pub fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    starts_well
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !name.starts_with("__")
}

/// Coerces a model or property name into a valid GraphQL name.
///
/// Characters outside `[_0-9A-Za-z]` become `_` (so `Page«Book»` becomes
/// `Page_Book_`), and a leading digit gets a `_` prefix.
pub fn graphql_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c == '_' || c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    if sanitized.starts_with("__") {
        sanitized.replace_range(..2, "x_");
    }
    sanitized
}
