pub const IF_ATTR: &str = "*ngif";
pub const FOR_ATTR: &str = "*ngfor";
pub const OUTLET_ATTR: &str = "*ngtemplateoutlet";

/// What an attribute means to the compiler, decided from its name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `*ngif="test"` or `*ngif="test as alias"`.
    If { test: &'a str, alias: Option<&'a str> },
    /// `*ngfor="let var of source"`.
    For { var: &'a str, source: &'a str },
    /// `[name]="expr"`.
    Property { name: &'a str, expr: &'a str },
    /// `[class.name]="expr"`.
    ClassToggle { class: &'a str, expr: &'a str },
    /// `[style.prop]="raw"`; the value is used as written.
    Style { prop: &'a str, raw: &'a str },
    /// `[style.prop.unit]="expr"`.
    StyleUnit {
        prop: &'a str,
        unit: &'a str,
        expr: &'a str,
    },
    /// `*ngtemplateoutlet="name"`, only meaningful on a container.
    Outlet { fragment: &'a str },
    Plain,
}

impl<'a> Directive<'a> {
    pub fn classify(name: &'a str, value: &'a str) -> Directive<'a> {
        match name {
            IF_ATTR => {
                return match split_alias(value) {
                    Some((test, alias)) => Directive::If {
                        test,
                        alias: Some(alias),
                    },
                    None => Directive::If { test: value, alias: None },
                };
            }
            FOR_ATTR => {
                return split_for(value)
                    .map_or(Directive::Plain, |(var, source)| Directive::For { var, source });
            }
            OUTLET_ATTR => return Directive::Outlet { fragment: value },
            _ => {}
        }

        let Some(binding) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) else {
            return Directive::Plain;
        };
        let parts: Vec<&str> = binding.split('.').collect();
        match parts.as_slice() {
            &["class", class] => Directive::ClassToggle { class, expr: value },
            &["style", prop] => Directive::Style { prop, raw: value },
            &["style", prop, unit] => Directive::StyleUnit {
                prop,
                unit,
                expr: value,
            },
            _ if binding.is_empty() => Directive::Plain,
            _ => Directive::Property {
                name: binding,
                expr: value,
            },
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split `test as alias`, using the last `as` followed by one trailing word.
fn split_alias(value: &str) -> Option<(&str, &str)> {
    let trimmed = value.trim_end();
    let alias_len = trimmed.chars().rev().take_while(|c| is_word(*c)).count();
    let alias_start = trimmed.len() - alias_len;
    let alias = &trimmed[alias_start..];
    if alias.is_empty() {
        return None;
    }
    let rest = &trimmed[..alias_start];
    let keyword = rest.trim_end();
    if keyword.len() == rest.len() {
        return None;
    }
    let before = keyword.strip_suffix("as")?;
    let test = before.trim_end();
    if test.len() == before.len() {
        return None;
    }
    Some((test, alias))
}

/// Split `let var of source` (or `var var of source`).
fn split_for(value: &str) -> Option<(&str, &str)> {
    let value = value.trim_start();
    let rest = value
        .strip_prefix("let")
        .or_else(|| value.strip_prefix("var"))?;
    let rest_trimmed = rest.trim_start();
    if rest_trimmed.len() == rest.len() {
        return None;
    }
    let var_len = rest_trimmed.chars().take_while(|c| is_word(*c)).count();
    let (var, rest) = rest_trimmed.split_at(var_len);
    if var.is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let source = rest.trim_start().strip_prefix("of")?;
    Some((var, source.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_with_alias() {
        assert_eq!(
            Directive::classify("*ngif", "user.find(u => u.ok) as found"),
            Directive::If {
                test: "user.find(u => u.ok)",
                alias: Some("found"),
            }
        );
        assert_eq!(
            Directive::classify("*ngif", "flag"),
            Directive::If { test: "flag", alias: None }
        );
        assert_eq!(
            Directive::classify("*ngif", "alias"),
            Directive::If { test: "alias", alias: None }
        );
    }

    #[test]
    fn loop_grammar() {
        assert_eq!(
            Directive::classify("*ngfor", "let item of items"),
            Directive::For { var: "item", source: "items" }
        );
        assert_eq!(
            Directive::classify("*ngfor", "var i of [0, 1]"),
            Directive::For { var: "i", source: "[0, 1]" }
        );
        assert_eq!(Directive::classify("*ngfor", "let of items"), Directive::Plain);
        assert_eq!(Directive::classify("*ngfor", "items"), Directive::Plain);
        assert_eq!(Directive::classify("*ngfor", "letter of items"), Directive::Plain);
    }

    #[test]
    fn names_are_ascii_words() {
        assert_eq!(
            Directive::classify("*ngif", "user as café"),
            Directive::If { test: "user as café", alias: None }
        );
        assert_eq!(Directive::classify("*ngfor", "let é of items"), Directive::Plain);
        assert_eq!(
            Directive::classify("*ngfor", "let item_2 of items"),
            Directive::For { var: "item_2", source: "items" }
        );
    }

    #[test]
    fn bindings() {
        assert_eq!(
            Directive::classify("[src]", "'/a/' + b"),
            Directive::Property { name: "src", expr: "'/a/' + b" }
        );
        assert_eq!(
            Directive::classify("[class.active]", "on"),
            Directive::ClassToggle { class: "active", expr: "on" }
        );
        assert_eq!(
            Directive::classify("[style.color]", "red"),
            Directive::Style { prop: "color", raw: "red" }
        );
        assert_eq!(
            Directive::classify("[style.max-width.px]", "100+500"),
            Directive::StyleUnit {
                prop: "max-width",
                unit: "px",
                expr: "100+500",
            }
        );
        assert_eq!(
            Directive::classify("[style.a.b.c]", "x"),
            Directive::Property { name: "style.a.b.c", expr: "x" }
        );
    }

    #[test]
    fn plain_attributes() {
        assert_eq!(Directive::classify("class", "x"), Directive::Plain);
        assert_eq!(Directive::classify("#tpl", ""), Directive::Plain);
        assert_eq!(Directive::classify("[]", "x"), Directive::Plain);
    }
}
