//! `{name}` message templating against the evaluation environment.
//!
//! Rule descriptions may interpolate environment bindings, including
//! dotted paths. Any unresolvable placeholder or malformed template
//! yields the raw description unchanged; templating never raises.

use crate::engine::document::value_to_string;
use crate::engine::env::Environment;

/// Render a description template, falling back to the raw text.
pub fn render(template: &str, env: &Environment) -> String {
    match try_render(template, env) {
        Some(rendered) => rendered,
        None => template.to_string(),
    }
}

fn try_render(template: &str, env: &Environment) -> Option<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    output.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                            name.push(c);
                        }
                        _ => return None,
                    }
                }
                let value = env.resolve_path(&name)?;
                output.push_str(&value_to_string(value));
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    output.push('}');
                } else {
                    return None;
                }
            }
            c => output.push(c),
        }
    }

    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn env(document: Value) -> Environment {
        Environment::build(&document, "W2", Some(2024), Map::new())
    }

    #[test]
    fn test_render_scalar_binding() {
        let env = env(json!({"amounts": {"wages": 85000}}));
        assert_eq!(
            render("Reported {wages} in wages.", &env),
            "Reported 85000 in wages."
        );
    }

    #[test]
    fn test_render_dotted_path() {
        let env = env(json!({"employer": {"name": "ACME"}}));
        assert_eq!(render("Employer {employer.name}.", &env), "Employer ACME.");
    }

    #[test]
    fn test_unresolvable_placeholder_falls_back_to_raw() {
        let env = env(json!({}));
        assert_eq!(
            render("Missing {no_such_binding} here.", &env),
            "Missing {no_such_binding} here."
        );
    }

    #[test]
    fn test_malformed_template_falls_back_to_raw() {
        let env = env(json!({}));
        assert_eq!(render("unbalanced {wages", &env), "unbalanced {wages");
        assert_eq!(render("stray } brace", &env), "stray } brace");
    }

    #[test]
    fn test_escaped_braces() {
        let env = env(json!({}));
        assert_eq!(render("literal {{braces}}", &env), "literal {braces}");
    }

    #[test]
    fn test_null_renders_empty() {
        let env = env(json!({}));
        assert_eq!(render("ssn=[{taxpayer_ssn}]", &env), "ssn=[]");
    }

    #[test]
    fn test_plain_text_passthrough() {
        let env = env(json!({}));
        assert_eq!(render("no placeholders", &env), "no placeholders");
    }
}
