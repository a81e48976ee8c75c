//! Tolerant JSON extraction from free-form completion text.
//!
//! Models wrap their JSON in prose, code fences, or both. Rather than
//! trusting the whole reply to be JSON, these scanners locate the first
//! balanced object or array and hand just that slice to serde.

/// The first balanced `{...}` in `text`, or `None`.
pub fn first_json_object(text: &str) -> Option<&str> {
  first_balanced(text, b'{', b'}')
}

/// The first balanced `[...]` in `text`, or `None`.
pub fn first_json_array(text: &str) -> Option<&str> {
  first_balanced(text, b'[', b']')
}

fn first_balanced(text: &str, open: u8, close: u8) -> Option<&str> {
  let bytes = text.as_bytes();
  let start = bytes.iter().position(|&b| b == open)?;

  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (i, &b) in bytes.iter().enumerate().skip(start) {
    if in_string {
      if escaped {
        escaped = false;
      } else if b == b'\\' {
        escaped = true;
      } else if b == b'"' {
        in_string = false;
      }
      continue;
    }
    match b {
      b'"' => in_string = true,
      _ if b == open => depth += 1,
      _ if b == close => {
        depth -= 1;
        if depth == 0 {
          return Some(&text[start..=i]);
        }
      }
      _ => {}
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finds_object_inside_prose_and_fences() {
    let reply = "Sure! Here is the data:\n```json\n{\"vendor_name\": \
                 \"Acme\", \"nested\": {\"a\": 1}}\n```\nLet me know.";
    assert_eq!(
      first_json_object(reply),
      Some("{\"vendor_name\": \"Acme\", \"nested\": {\"a\": 1}}")
    );
  }

  #[test]
  fn braces_inside_strings_do_not_unbalance() {
    let reply = r#"{"note": "see {section 3} for details", "ok": true}"#;
    assert_eq!(first_json_object(reply), Some(reply));
  }

  #[test]
  fn escaped_quotes_inside_strings() {
    let reply = r#"{"quote": "he said \"hello}\" loudly"}"#;
    assert_eq!(first_json_object(reply), Some(reply));
  }

  #[test]
  fn finds_array_skipping_earlier_objects_text() {
    let reply = "The clauses are: [{\"title\": \"Penalty\"}, {\"title\": \
                 \"Renewal\"}] as requested.";
    assert_eq!(
      first_json_array(reply),
      Some("[{\"title\": \"Penalty\"}, {\"title\": \"Renewal\"}]")
    );
  }

  #[test]
  fn absent_json_yields_none() {
    assert_eq!(first_json_object("no structured data here"), None);
    assert_eq!(first_json_array("still nothing"), None);
  }

  #[test]
  fn unterminated_json_yields_none() {
    assert_eq!(first_json_object("{\"a\": {\"b\": 1}"), None);
  }
}
