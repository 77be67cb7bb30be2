//! Navigation scripts
//!
//! One step per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! click /foo {"pageTitle": "Foo"}
//! navigate /bar?x=1
//! scroll 0 250
//! wait 200
//! back
//! forward
//! ```

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("line {line}: unknown step '{step}'")]
    UnknownStep { line: usize, step: String },

    #[error("line {line}: '{step}' needs {expected}")]
    MissingArgument {
        line: usize,
        step: &'static str,
        expected: &'static str,
    },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: invalid params: {source}")]
    InvalidParams {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Primary click on a link
    Click { href: String, params: Option<Value> },
    /// Programmatic navigation
    Navigate { url: String },
    Back,
    Forward,
    /// User scroll to an offset
    Scroll { x: f64, y: f64 },
    /// Let virtual time pass
    Wait { millis: u64 },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Click { href, params: None } => write!(f, "click {}", href),
            Step::Click {
                href,
                params: Some(params),
            } => write!(f, "click {} {}", href, params),
            Step::Navigate { url } => write!(f, "navigate {}", url),
            Step::Back => f.write_str("back"),
            Step::Forward => f.write_str("forward"),
            Step::Scroll { x, y } => write!(f, "scroll {} {}", x, y),
            Step::Wait { millis } => write!(f, "wait {}", millis),
        }
    }
}

fn number<T: FromStr>(line: usize, value: &str) -> Result<T, ScriptError> {
    value.parse().map_err(|_| ScriptError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}

fn parse_step(line: usize, text: &str) -> Result<Step, ScriptError> {
    let (command, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(c, r)| (c, r.trim()));

    let missing = |step, expected| ScriptError::MissingArgument {
        line,
        step,
        expected,
    };

    match command {
        "click" => {
            let (href, params) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(h, p)| (h, p.trim()));
            if href.is_empty() {
                return Err(missing("click", "an href"));
            }
            let params = if params.is_empty() {
                None
            } else {
                Some(
                    serde_json::from_str(params)
                        .map_err(|source| ScriptError::InvalidParams { line, source })?,
                )
            };
            Ok(Step::Click {
                href: href.to_string(),
                params,
            })
        }
        "navigate" => {
            if rest.is_empty() {
                return Err(missing("navigate", "a url"));
            }
            Ok(Step::Navigate {
                url: rest.to_string(),
            })
        }
        "back" => Ok(Step::Back),
        "forward" => Ok(Step::Forward),
        "scroll" => {
            let mut parts = rest.split_whitespace();
            let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
                return Err(missing("scroll", "x and y offsets"));
            };
            Ok(Step::Scroll {
                x: number(line, x)?,
                y: number(line, y)?,
            })
        }
        "wait" => {
            if rest.is_empty() {
                return Err(missing("wait", "a duration in milliseconds"));
            }
            Ok(Step::Wait {
                millis: number(line, rest)?,
            })
        }
        other => Err(ScriptError::UnknownStep {
            line,
            step: other.to_string(),
        }),
    }
}

pub fn parse_script(source: &str) -> Result<Vec<Step>, ScriptError> {
    source
        .lines()
        .enumerate()
        .map(|(i, text)| (i + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .map(|(line, text)| parse_step(line, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_script() {
        let steps = parse_script(
            r#"
            # open a page
            click /foo {"pageTitle": "Foo"}
            navigate /bar?x=1
            scroll 0 250.5
            wait 200
            back
            forward
            "#,
        )
        .unwrap();

        assert_eq!(
            steps,
            vec![
                Step::Click {
                    href: "/foo".to_string(),
                    params: Some(json!({"pageTitle": "Foo"})),
                },
                Step::Navigate {
                    url: "/bar?x=1".to_string()
                },
                Step::Scroll { x: 0.0, y: 250.5 },
                Step::Wait { millis: 200 },
                Step::Back,
                Step::Forward,
            ]
        );
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = parse_script("back\njump /x").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownStep { line: 2, .. }));

        let err = parse_script("scroll 10").unwrap_err();
        assert!(matches!(err, ScriptError::MissingArgument { step: "scroll", .. }));

        let err = parse_script("wait soon").unwrap_err();
        assert_eq!(err.to_string(), "line 1: invalid number 'soon'");

        let err = parse_script("click /a {oops").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidParams { line: 1, .. }));
    }

    #[test]
    fn test_display() {
        let step = Step::Click {
            href: "/a".to_string(),
            params: Some(json!({"id": 1})),
        };
        assert_eq!(step.to_string(), r#"click /a {"id":1}"#);
        assert_eq!(Step::Wait { millis: 5 }.to_string(), "wait 5");
    }
}
