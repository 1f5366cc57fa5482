//! `${…}` string templates.

use serde_json::Value;

use crate::error::{ExprError, ExprResult};
use crate::eval::stringify;
use crate::Expression;

/// Render `text`, replacing each `${expr}` with the expression evaluated
/// against `ctx`. Undefined renders as nothing, strings verbatim, anything
/// else as JSON.
pub fn render_template(text: &str, ctx: &Value) -> ExprResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut offset = 0;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body_start = start + 2;
        let end = closing_brace(&rest[body_start..]).ok_or(ExprError::Unterminated {
            what: "template placeholder",
            pos: offset + start,
        })?;
        let source = &rest[body_start..body_start + end];
        let value = Expression::compile(source)?.evaluate(ctx)?;
        out.push_str(&stringify(&value));

        let consumed = body_start + end + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Byte index of the `}` closing a placeholder, skipping quoted strings.
fn closing_brace(body: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '}' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_placeholders() {
        let ctx = json!({"name": "Ada", "n": 3});
        assert_eq!(render_template("Hello ${name}!", &ctx).unwrap(), "Hello Ada!");
        assert_eq!(render_template("${n * 2} items", &ctx).unwrap(), "6 items");
    }

    #[test]
    fn undefined_renders_empty_and_objects_as_json() {
        let ctx = json!({"o": {"a": 1}});
        assert_eq!(render_template("[${missing}]", &ctx).unwrap(), "[]");
        assert_eq!(render_template("${o}", &ctx).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn braces_inside_strings() {
        let ctx = json!({});
        assert_eq!(render_template("${'}' & 'x'}", &ctx).unwrap(), "}x");
    }

    #[test]
    fn plain_text_and_errors() {
        let ctx = json!({});
        assert_eq!(render_template("no placeholders", &ctx).unwrap(), "no placeholders");
        assert!(matches!(
            render_template("oops ${name", &ctx),
            Err(ExprError::Unterminated { pos: 5, .. })
        ));
        assert!(matches!(
            render_template("${1 +}", &ctx),
            Err(ExprError::Parse { .. })
        ));
    }
}
